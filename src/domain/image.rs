use serde::{Deserialize, Serialize};

/// Reference to an uploaded image, as handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: String,
    pub url: String,
    pub name: String,
}
