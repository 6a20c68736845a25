//! Shared record fixtures for query engine tests

use serde_json::{Value, json};

const DEPARTMENTS: [&str; 4] = ["Engineering", "Sales", "Support", "Finance"];
const TITLES: [&str; 3] = ["Senior Engineer", "Junior Engineer", "Senior Analyst"];
const CITIES: [&str; 3] = ["Berlin", "Lyon", "Austin"];

/// `count` users with deterministic, varied fields. Every seventh user has no salary.
pub fn sample_users(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let salary = if i % 7 == 6 {
                Value::Null
            } else {
                json!(40_000 + (i as u64 * 3_700) % 60_000)
            };
            json!({
                "id": i + 1,
                "username": format!("user{}", i + 1),
                "profile": {
                    "firstName": format!("First{}", i),
                    "lastName": format!("Last{}", i % 5),
                    "nationality": if i % 2 == 0 { "FR" } else { "DE" },
                },
                "work": {
                    "title": TITLES[i % TITLES.len()],
                    "department": DEPARTMENTS[i % DEPARTMENTS.len()],
                    "startDate": format!("2020-{:02}-{:02}", (i % 12) + 1, (i % 27) + 1),
                    "skills": if i % 3 == 0 { json!(["Rust", "SQL"]) } else { json!(["Go"]) },
                },
                "contact": {
                    "primaryEmail": format!("user{}@example.com", i + 1),
                    "address": { "city": CITIES[i % CITIES.len()] },
                },
                "finance": { "salary": salary },
                "isActive": i % 4 != 0,
            })
        })
        .collect()
}

pub fn with_salaries(salaries: &[u64]) -> Vec<Value> {
    salaries
        .iter()
        .enumerate()
        .map(|(i, s)| json!({"id": i + 1, "finance": {"salary": s}}))
        .collect()
}

pub fn ids(records: &[Value]) -> Vec<u64> {
    records.iter().filter_map(|r| r["id"].as_u64()).collect()
}
