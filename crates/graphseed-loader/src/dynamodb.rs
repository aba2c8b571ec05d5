//! DynamoDB-backed [`BatchWriter`] (`BatchWriteItem`).

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use serde_json::Value;

use crate::store::{BatchOutput, BatchWriter, Item, StoreError, WriteBatch};

pub struct DynamoDbWriter {
    client: Client,
}

impl DynamoDbWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client configured from the standard AWS environment (region,
    /// credentials chain, profile).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl BatchWriter for DynamoDbWriter {
    async fn batch_write(&self, batch: &WriteBatch) -> Result<BatchOutput, StoreError> {
        let requests = batch
            .puts
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_attribute_map(item)))
                    .build()
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(batch.table.clone(), requests)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let unprocessed = output
            .unprocessed_items()
            .map(|tables| tables.values().map(Vec::len).sum())
            .unwrap_or(0);
        Ok(BatchOutput { unprocessed })
    }
}

fn classify_sdk_error(err: SdkError<BatchWriteItemError>) -> StoreError {
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::ServiceError(service) => match service.err() {
            BatchWriteItemError::ProvisionedThroughputExceededException(_)
            | BatchWriteItemError::RequestLimitExceeded(_) => StoreError::Throttled(message),
            BatchWriteItemError::InternalServerError(_) => StoreError::Transport(message),
            _ => StoreError::Rejected(message),
        },
        SdkError::ConstructionFailure(_) => StoreError::Serialization(message),
        _ => StoreError::Transport(message),
    }
}

pub fn to_attribute_map(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), to_attribute_value(value)))
        .collect()
}

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_conversion() {
        let item = match json!({
            "PK": "USER#1a@b.c",
            "SK": "MOVIE#The-Yak",
            "rating": 7,
            "flag": true,
            "missing": null,
            "tags": ["a", 2],
            "nested": {"k": "v"}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let attrs = to_attribute_map(&item);
        assert_eq!(attrs["PK"], AttributeValue::S("USER#1a@b.c".to_string()));
        assert_eq!(attrs["rating"], AttributeValue::N("7".to_string()));
        assert_eq!(attrs["flag"], AttributeValue::Bool(true));
        assert_eq!(attrs["missing"], AttributeValue::Null(true));
        assert_eq!(
            attrs["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("a".to_string()),
                AttributeValue::N("2".to_string())
            ])
        );
        match &attrs["nested"] {
            AttributeValue::M(map) => assert_eq!(map["k"], AttributeValue::S("v".to_string())),
            other => panic!("expected map, got {other:?}"),
        }
    }
}
