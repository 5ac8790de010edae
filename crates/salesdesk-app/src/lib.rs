// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod coordinator;
pub mod error;
pub mod evaluate;
pub mod filters;
pub mod ids;
pub mod model;
pub mod pagination;
pub mod record;
pub mod session;
pub mod sort;
pub mod view;

pub use columns::*;
pub use coordinator::*;
pub use error::*;
pub use evaluate::*;
pub use filters::*;
pub use ids::*;
pub use model::*;
pub use pagination::*;
pub use record::*;
pub use session::*;
pub use sort::*;
pub use view::*;
