//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use nestflat_core::types::{NestedColumn, PrimitiveArray, RowBatch};

pub struct Phone {
    pub number: i32,
    pub kind: i32,
}

pub struct Address {
    pub apt: i32,
    pub zip: i32,
    pub phones: Vec<Phone>,
}

pub struct Person {
    pub age: i32,
    pub salary: i64,
    pub addresses: Vec<Address>,
}

fn phones(numbers: [i32; 3]) -> Vec<Phone> {
    numbers
        .iter()
        .zip(0..)
        .map(|(&number, kind)| Phone { number, kind })
        .collect()
}

/// Two people, two addresses each, three phones per address.
pub fn sample_people() -> Vec<Person> {
    vec![
        Person {
            age: 35,
            salary: 100_000,
            addresses: vec![
                Address {
                    apt: 1016,
                    zip: 94404,
                    phones: phones([412482, 412483, 412484]),
                },
                Address {
                    apt: 1017,
                    zip: 94405,
                    phones: phones([412483, 412484, 412485]),
                },
            ],
        },
        Person {
            age: 55,
            salary: 200_000,
            addresses: vec![
                Address {
                    apt: 1020,
                    zip: 94402,
                    phones: phones([100, 101, 102]),
                },
                Address {
                    apt: 1021,
                    zip: 94403,
                    phones: phones([101, 102, 103]),
                },
            ],
        },
    ]
}

/// `person: struct{age, salary, addresses: list<address: struct{apt, zip,
/// phones: list<phone: struct{number, type}>}>}`
pub fn people_column(people: &[Person]) -> NestedColumn {
    let addresses: Vec<&Address> = people.iter().flat_map(|p| &p.addresses).collect();
    let all_phones: Vec<&Phone> = addresses.iter().copied().flat_map(|a| &a.phones).collect();

    let phone = NestedColumn::structure(
        "phone",
        vec![
            NestedColumn::primitive(
                "number",
                all_phones.iter().map(|p| p.number).collect::<Vec<_>>(),
            ),
            NestedColumn::primitive("type", all_phones.iter().map(|p| p.kind).collect::<Vec<_>>()),
        ],
    )
    .expect("phone struct");
    let phone_lengths: Vec<usize> = addresses.iter().map(|a| a.phones.len()).collect();

    let address = NestedColumn::structure(
        "address",
        vec![
            NestedColumn::primitive("apt", addresses.iter().map(|a| a.apt).collect::<Vec<_>>()),
            NestedColumn::primitive("zip", addresses.iter().map(|a| a.zip).collect::<Vec<_>>()),
            NestedColumn::list_from_lengths("phones", &phone_lengths, phone).expect("phones"),
        ],
    )
    .expect("address struct");
    let address_lengths: Vec<usize> = people.iter().map(|p| p.addresses.len()).collect();

    NestedColumn::structure(
        "person",
        vec![
            NestedColumn::primitive("age", people.iter().map(|p| p.age).collect::<Vec<_>>()),
            NestedColumn::primitive("salary", people.iter().map(|p| p.salary).collect::<Vec<_>>()),
            NestedColumn::list_from_lengths("addresses", &address_lengths, address)
                .expect("addresses"),
        ],
    )
    .expect("person struct")
}

pub fn person_column() -> NestedColumn {
    people_column(&sample_people())
}

pub fn i32_values(batch: &RowBatch, name: &str) -> Vec<i32> {
    match &batch.column(name).expect("column").values {
        PrimitiveArray::Int32(values) => values.iter().map(|v| v.expect("non-null")).collect(),
        other => panic!("column {name} is not Int32: {:?}", other.data_type()),
    }
}

pub fn i64_values(batch: &RowBatch, name: &str) -> Vec<i64> {
    match &batch.column(name).expect("column").values {
        PrimitiveArray::Int64(values) => values.iter().map(|v| v.expect("non-null")).collect(),
        other => panic!("column {name} is not Int64: {:?}", other.data_type()),
    }
}
