use crate::error::{MaintError, Result};
use crate::ops::OpReport;
use crate::store::{value_to_i64, value_to_text, StorePool, TableResolver};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of sales document types that can be (re)notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesEntityKind {
    Order,
    Invoice,
    Shipment,
    Creditmemo,
}

impl SalesEntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesEntityKind::Order => "order",
            SalesEntityKind::Invoice => "invoice",
            SalesEntityKind::Shipment => "shipment",
            SalesEntityKind::Creditmemo => "creditmemo",
        }
    }
}

impl fmt::Display for SalesEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesEntityKind {
    type Err = MaintError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "order" => Ok(SalesEntityKind::Order),
            "invoice" => Ok(SalesEntityKind::Invoice),
            "shipment" => Ok(SalesEntityKind::Shipment),
            "creditmemo" => Ok(SalesEntityKind::Creditmemo),
            other => Err(MaintError::UnsupportedType(other.to_string())),
        }
    }
}

/// The slice of a sales document a notification needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDocument {
    pub entity_id: i64,
    pub increment_id: String,
    pub recipient: String,
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn load(&self, entity_id: i64) -> Result<SalesDocument>;
}

#[async_trait]
pub trait DocumentSender: Send + Sync {
    async fn send(&self, kind: SalesEntityKind, document: &SalesDocument) -> Result<()>;
}

/// Loads sales documents from the store. Child documents (invoice, shipment,
/// creditmemo) resolve the recipient through their parent order.
pub struct DbDocumentRepository {
    pool: StorePool,
    resolver: TableResolver,
    kind: SalesEntityKind,
}

impl DbDocumentRepository {
    pub fn new(pool: StorePool, resolver: TableResolver, kind: SalesEntityKind) -> Self {
        Self { pool, resolver, kind }
    }

    fn query_for(&self, entity_id: i64) -> String {
        let order_table = self.resolver.resolve("sales_order");
        match self.kind {
            SalesEntityKind::Order => format!(
                "SELECT entity_id, increment_id, customer_email FROM {} WHERE entity_id = {}",
                order_table, entity_id
            ),
            SalesEntityKind::Invoice | SalesEntityKind::Shipment | SalesEntityKind::Creditmemo => {
                let child_table = self
                    .resolver
                    .resolve(&format!("sales_{}", self.kind.as_str()));
                format!(
                    "SELECT e.entity_id, e.increment_id, o.customer_email \
                     FROM {} AS e JOIN {} AS o ON o.entity_id = e.order_id \
                     WHERE e.entity_id = {}",
                    child_table, order_table, entity_id
                )
            }
        }
    }
}

#[async_trait]
impl DocumentRepository for DbDocumentRepository {
    async fn load(&self, entity_id: i64) -> Result<SalesDocument> {
        let row = self
            .pool
            .fetch_optional(&self.query_for(entity_id))
            .await?
            .ok_or_else(|| {
                MaintError::store(format!(
                    "No {} found with ID {}.",
                    self.kind, entity_id
                ))
            })?;

        Ok(SalesDocument {
            entity_id: row.get("entity_id").and_then(value_to_i64).unwrap_or(entity_id),
            increment_id: row.get("increment_id").map(value_to_text).unwrap_or_default(),
            recipient: row.get("customer_email").map(value_to_text).unwrap_or_default(),
        })
    }
}

/// Posts a JSON notification to the configured mail endpoint. Delivery past
/// that endpoint is somebody else's job.
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookSender {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl DocumentSender for WebhookSender {
    async fn send(&self, kind: SalesEntityKind, document: &SalesDocument) -> Result<()> {
        let payload = serde_json::json!({
            "type": kind.as_str(),
            "entityId": document.entity_id,
            "incrementId": document.increment_id,
            "recipient": document.recipient,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MaintError::store(format!("Notification request failed: {}", e)))?;

        response
            .error_for_status()
            .map_err(|e| MaintError::store(format!("Notification rejected: {}", e)))?;
        Ok(())
    }
}

/// Binds a document type to its repository/sender capability pair.
pub struct EmailDispatcher {
    kind: SalesEntityKind,
    repository: Box<dyn DocumentRepository>,
    sender: Box<dyn DocumentSender>,
}

impl EmailDispatcher {
    pub fn new(
        kind: SalesEntityKind,
        repository: Box<dyn DocumentRepository>,
        sender: Box<dyn DocumentSender>,
    ) -> Self {
        Self {
            kind,
            repository,
            sender,
        }
    }

    pub fn for_kind(
        kind: SalesEntityKind,
        pool: StorePool,
        resolver: TableResolver,
        mail_endpoint: &str,
    ) -> Self {
        Self::new(
            kind,
            Box::new(DbDocumentRepository::new(pool, resolver, kind)),
            Box::new(WebhookSender::new(mail_endpoint)),
        )
    }

    /// Sends one notification per id. A failed id is logged and the loop
    /// continues.
    pub async fn send_all(&self, entity_ids: &[i64]) -> Result<OpReport> {
        let mut report = OpReport::default();

        for &entity_id in entity_ids {
            let outcome = async {
                let document = self.repository.load(entity_id).await?;
                self.sender.send(self.kind, &document).await
            }
            .await;

            match outcome {
                Ok(()) => {
                    report.processed += 1;
                    log::info!("Email has been sent for {} with ID {}.", self.kind, entity_id);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!(
                        "Could not send email for {} with ID {}: {}",
                        self.kind,
                        entity_id,
                        e
                    );
                }
            }
        }

        Ok(report)
    }
}
