use serde::{Deserialize, Serialize};
use std::fmt;

/// Which contact table a [`DomainContact`] lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Client,
    Manager,
}

impl ContactKind {
    pub fn table(&self) -> &'static str {
        match self {
            ContactKind::Client => "clients",
            ContactKind::Manager => "managers",
        }
    }
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactKind::Client => f.write_str("client"),
            ContactKind::Manager => f.write_str("manager"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainContact {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConsultant {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultant {
    pub name: String,
    pub email: String,
    pub client_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_name: Option<String>,
}
