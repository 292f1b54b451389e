use serde::{Deserialize, Serialize};

pub type BillerId = u32;

/// The merchant on whose behalf payments are routed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Biller {
    pub id: BillerId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}
