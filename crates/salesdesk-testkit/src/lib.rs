// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use salesdesk_app::{
    Amount, LineItem, LineItemId, OrderId, OrderStatus, PageResult, SalesOrder, SalesPerson,
    SalesPersonId,
};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use time::{Date, Duration, Month};
use tiny_http::{Header, Response, Server};

const OIL_TYPES: [&str; 8] = [
    "Olive Oil",
    "Coconut Oil",
    "Sunflower Oil",
    "Mustard Oil",
    "Groundnut Oil",
    "Sesame Oil",
    "Rice Bran Oil",
    "Palm Oil",
];

const CUSTOMER_NAMES: [&str; 10] = [
    "Ravi", "Mehta", "Kaveri", "Lakshmi", "Sagar", "Annapurna", "Ganesh", "Shree", "Nandini",
    "Patel",
];
const CUSTOMER_SUFFIXES: [&str; 5] = ["Traders", "Stores", "Foods", "Mart", "Kirana"];

const FIRST_NAMES: [&str; 12] = [
    "Asha", "Vikram", "Priya", "Arjun", "Neha", "Rahul", "Meera", "Karan", "Divya", "Sameer",
    "Pooja", "Rohan",
];
const LAST_NAMES: [&str; 10] = [
    "Rao", "Sharma", "Iyer", "Nair", "Gupta", "Menon", "Joshi", "Kulkarni", "Reddy", "Das",
];

const CITIES: [&str; 8] = [
    "Pune",
    "Mumbai",
    "Nashik",
    "Nagpur",
    "Kolhapur",
    "Aurangabad",
    "Satara",
    "Solapur",
];
const STREETS: [&str; 8] = [
    "Mill Road",
    "Station Road",
    "Market Lane",
    "Temple Street",
    "MG Road",
    "Gandhi Chowk",
    "Canal Road",
    "Ring Road",
];

const REFERENCE_YEAR: i32 = 2024;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for realistic sales orders. The same seed always yields
/// the same sequence, with ids counting up from 1.
#[derive(Debug, Clone)]
pub struct OrderFaker {
    rng: DeterministicRng,
    next_order_id: i64,
    next_item_id: i64,
}

impl OrderFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_order_id: 1,
            next_item_id: 1,
        }
    }

    pub fn sales_person(&mut self) -> SalesPerson {
        SalesPerson {
            id: SalesPersonId::new(self.rng.int_n(50) as i64 + 1),
            first_name: self.pick(&FIRST_NAMES).to_owned(),
            last_name: self.pick(&LAST_NAMES).to_owned(),
        }
    }

    pub fn line_item(&mut self) -> LineItem {
        let id = self.next_item_id;
        self.next_item_id += 1;
        LineItem {
            id: LineItemId::new(id),
            product_name: self.pick(&OIL_TYPES).to_owned(),
            quantity: self.rng.int_n(20) as i64 + 1,
        }
    }

    pub fn sales_order(&mut self) -> SalesOrder {
        let id = self.next_order_id;
        self.next_order_id += 1;

        let item_count = self.rng.int_n(3) + 1;
        let items = (0..item_count).map(|_| self.line_item()).collect();
        let status = OrderStatus::KNOWN[self.rng.int_n(OrderStatus::KNOWN.len())].clone();
        let rupees = self.rng.int_n(20_000) + 100;
        let paise = self.rng.int_n(100);
        let sales_person = if self.rng.bool() {
            Some(self.sales_person())
        } else {
            None
        };

        SalesOrder {
            id: OrderId::new(id),
            order_number: format!("SO-{id:05}"),
            customer_name: format!(
                "{} {}",
                self.pick(&CUSTOMER_NAMES),
                self.pick(&CUSTOMER_SUFFIXES)
            ),
            address: format!("{} {}", self.rng.int_n(200) + 1, self.pick(&STREETS)),
            city: self.pick(&CITIES).to_owned(),
            status,
            total_amount: Amount::Text(format!("{rupees}.{paise:02}")),
            order_date: Some(self.date_in_year(REFERENCE_YEAR)),
            sales_person,
            items,
        }
    }

    pub fn sales_orders(&mut self, count: usize) -> Vec<SalesOrder> {
        (0..count).map(|_| self.sales_order()).collect()
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = Date::from_calendar_date(year, Month::January, 1).unwrap_or(Date::MIN);
        let offset = self.rng.int_n(365) as i64;
        start.checked_add(Duration::days(offset)).unwrap_or(start)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// One page of `orders` as the backend would return it for `page`.
pub fn page_of(orders: &[SalesOrder], page: usize, page_size: usize) -> PageResult<SalesOrder> {
    let start = page.saturating_sub(1) * page_size;
    let results: Vec<SalesOrder> = orders.iter().skip(start).take(page_size).cloned().collect();
    let has_next = start + results.len() < orders.len();
    PageResult {
        count: orders.len(),
        next: has_next.then(|| format!("?page={}", page + 1)),
        previous: (page > 1).then(|| format!("?page={}", page - 1)),
        results,
    }
}

pub fn page_json(page: &PageResult<SalesOrder>) -> Result<String> {
    serde_json::to_string(page).context("encode page fixture")
}

/// A canned reply for [`MockListServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json",
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub authorization: Option<String>,
}

/// Serves the scripted responses in order on `127.0.0.1`, one per request,
/// then stops and hands back what it saw.
pub struct MockListServer {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockListServer {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}/", server.server_addr());

        let handle = thread::spawn(move || -> Result<Vec<RecordedRequest>> {
            let mut seen = Vec::with_capacity(responses.len());
            for scripted in responses {
                let request = server.recv().context("receive mock request")?;
                seen.push(RecordedRequest {
                    url: request.url().to_owned(),
                    authorization: request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Authorization"))
                        .map(|header| header.value.as_str().to_owned()),
                });

                let content_type = Header::from_bytes("Content-Type", scripted.content_type)
                    .map_err(|()| anyhow!("invalid content type {:?}", scripted.content_type))?;
                let response = Response::from_string(scripted.body)
                    .with_status_code(scripted.status)
                    .with_header(content_type);
                request.respond(response).context("send mock response")?;
            }
            Ok(seen)
        });

        Ok(Self { base_url, handle })
    }

    /// Base URL with a trailing slash, e.g. `http://127.0.0.1:40123/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for every scripted response to be served.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("session.db");
    Ok((dir, db_path))
}

pub fn fixture_token() -> &'static str {
    "test-access-token"
}

pub fn oil_types() -> &'static [&'static str] {
    &OIL_TYPES
}
