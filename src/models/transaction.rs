use serde::{Deserialize, Deserializer, Serialize};

/// A single ledger transaction retained for a subscribed address.
///
/// Fields are kept exactly as the node reports them: `value` and
/// `block_number` stay hex text so records survive round-trips untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    /// Empty for contract creations, which carry a null `to` on the wire.
    #[serde(default, deserialize_with = "null_to_empty")]
    pub to: String,
    pub value: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
}

fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
