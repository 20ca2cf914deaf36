//! Sample records
//!
//! A fixed five-employee, three-company dataset with registered schemas,
//! used by the CLI and the test suites.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{FieldType, Record, Schema, Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Unknown => "Unknown",
        }
    }
}

impl From<Gender> for Value {
    fn from(gender: Gender) -> Self {
        Value::Text(gender.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
}

impl Record for Company {
    fn schema() -> Schema<Self> {
        Schema::new("Company")
            .field("Id", FieldType::required(ValueType::Uuid), |c: &Company| {
                c.id.into()
            })
            .field("Name", FieldType::required(ValueType::Text), |c: &Company| {
                c.name.as_str().into()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    pub number: i64,
    pub name: String,
    pub identification: Option<Uuid>,
    pub gender: Gender,
    pub introduce: Option<String>,
    pub birthday: NaiveDateTime,
    pub salary: Option<Decimal>,
    pub weight: f64,
    pub is_manager: bool,
    pub company_id: Option<Uuid>,
    pub company: Option<Company>,
}

impl Record for Employee {
    fn schema() -> Schema<Self> {
        Schema::new("Employee")
            .field("Number", FieldType::required(ValueType::Int), |e: &Employee| {
                e.number.into()
            })
            .field("Name", FieldType::required(ValueType::Text), |e: &Employee| {
                e.name.as_str().into()
            })
            .field(
                "Identification",
                FieldType::nullable(ValueType::Uuid),
                |e: &Employee| e.identification.into(),
            )
            .field("Gender", FieldType::required(ValueType::Text), |e: &Employee| {
                e.gender.into()
            })
            .field(
                "Introduce",
                FieldType::nullable(ValueType::Text),
                |e: &Employee| e.introduce.as_ref().into(),
            )
            .field(
                "Birthday",
                FieldType::required(ValueType::DateTime),
                |e: &Employee| e.birthday.into(),
            )
            .field(
                "Salary",
                FieldType::nullable(ValueType::Decimal),
                |e: &Employee| e.salary.into(),
            )
            .field("Weight", FieldType::required(ValueType::Float), |e: &Employee| {
                e.weight.into()
            })
            .field(
                "IsManager",
                FieldType::required(ValueType::Bool),
                |e: &Employee| e.is_manager.into(),
            )
            .field(
                "CompanyId",
                FieldType::nullable(ValueType::Uuid),
                |e: &Employee| e.company_id.into(),
            )
            .record("Company", |e| e.company.as_ref())
    }
}

const MICROSOFT: Uuid = Uuid::from_u128(0xc2cbfe28_f82a_4904_8075_bf98729d434f);
const GOOGLE: Uuid = Uuid::from_u128(0x5dd641dd_2ba4_4dfd_9572_81325ecd8940);
const APPLE: Uuid = Uuid::from_u128(0x80a6570c_ca98_4661_adde_e4d5a8637ee5);

/// The three sample companies
pub fn companies() -> Vec<Company> {
    vec![
        Company {
            id: MICROSOFT,
            name: "Microsoft".to_string(),
        },
        Company {
            id: GOOGLE,
            name: "Google".to_string(),
        },
        Company {
            id: APPLE,
            name: "Apple".to_string(),
        },
    ]
}

fn company(id: Uuid) -> Option<Company> {
    companies().into_iter().find(|c| c.id == id)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// The five sample employees, in arrival order
pub fn employees() -> Vec<Employee> {
    let employee = |number: i64,
                    name: &str,
                    identification: Option<u128>,
                    gender: Gender,
                    introduce: Option<&str>,
                    birthday: NaiveDateTime,
                    salary: i64,
                    weight: f64,
                    is_manager: bool,
                    company_id: Uuid| Employee {
        number,
        name: name.to_string(),
        identification: identification.map(Uuid::from_u128),
        gender,
        introduce: introduce.map(str::to_string),
        birthday,
        salary: Some(Decimal::from(salary)),
        weight,
        is_manager,
        company_id: Some(company_id),
        company: company(company_id),
    };

    vec![
        employee(
            1,
            "Monie",
            Some(0xff5f9bb3_f805_4f52_a5f9_fbd0493d5b8f),
            Gender::Female,
            Some("I'm Monie"),
            day(2000, 5, 5),
            1000,
            48.5,
            false,
            MICROSOFT,
        ),
        employee(
            2,
            "CoCo",
            Some(0x6f0d7b06_2b37_4b38_9f1c_0ae1c64f3c2e),
            Gender::Female,
            Some("I'm CoCo"),
            day(1986, 10, 10),
            2500,
            69.6,
            true,
            MICROSOFT,
        ),
        employee(
            3,
            "Kirin",
            Some(0x0a8b6d42_93c1_4fd4_8c3e_55d3f2c1b7a9),
            Gender::Male,
            None,
            day(1984, 7, 8),
            3000,
            73.8,
            false,
            GOOGLE,
        ),
        employee(
            4,
            "Rock",
            Some(0xd1e7c0a3_4b5f_4a2e_b8d9_7c6e5f4a3b21),
            Gender::Male,
            Some("I'm Rock"),
            day(1976, 11, 6),
            1750,
            82.8,
            false,
            APPLE,
        ),
        employee(
            5,
            "Pikachu",
            None,
            Gender::Unknown,
            Some("Pika~ Pika~"),
            day(2005, 3, 16),
            6600,
            52.9,
            false,
            APPLE,
        ),
    ]
}

/// Same employee with the salary cleared
pub fn without_salary(mut employee: Employee) -> Employee {
    employee.salary = None;
    employee
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldMatching;

    #[test]
    fn test_dataset_shape() {
        let employees = employees();
        assert_eq!(employees.len(), 5);
        assert!(employees.iter().all(|e| e.company.is_some()));
        assert_eq!(employees.iter().filter(|e| e.introduce.is_none()).count(), 1);
    }

    #[test]
    fn test_employee_schema_paths() {
        let schema = Employee::schema();
        let accessor = schema.resolve("Company.Id", FieldMatching::Exact).unwrap();
        assert_eq!(accessor.get(&employees()[2]), Value::Uuid(GOOGLE));

        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names.last(), Some(&"Company"));
    }

    #[test]
    fn test_serialized_employee() {
        let value = serde_json::to_value(&employees()[0]).unwrap();
        assert_eq!(value["Name"], "Monie");
        assert_eq!(value["Company"]["Name"], "Microsoft");
        assert_eq!(value["IsManager"], false);
    }
}
