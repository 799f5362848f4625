//! Transfer executor
//!
//! Single attempt per call. Requests that fail local validation are rejected
//! without reaching the collaborator.

use crate::error::TransferError;
use bridge_traits::error::BridgeError;
use bridge_traits::{TransferRequest, TransferResult, TransferService};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Invokes the move collaborator and classifies its failures
#[derive(Clone)]
pub struct TransferExecutor {
    service: Arc<dyn TransferService>,
}

impl TransferExecutor {
    pub fn new(service: Arc<dyn TransferService>) -> Self {
        Self { service }
    }

    #[instrument(skip(self, request), fields(
        records = request.record_ids.len(),
        destination = %request.destination_collection_id
    ))]
    pub async fn execute(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferResult, TransferError> {
        request.validate().map_err(TransferError::Rejected)?;

        match self.service.move_records(request).await {
            Ok(result) => {
                debug!(
                    records_added = result.records_added,
                    already_present = result.records_already_present,
                    "Transfer succeeded"
                );
                Ok(result)
            }
            Err(e) => {
                let error = classify(e);
                warn!(error = %error, retryable = error.is_retryable(), "Transfer failed");
                Err(error)
            }
        }
    }
}

/// Map a collaborator error onto the transfer error taxonomy
pub fn classify(error: BridgeError) -> TransferError {
    match error {
        BridgeError::Rejected(message) => TransferError::Rejected(message),
        BridgeError::NotFound(message) => TransferError::NotFound(message),
        BridgeError::NotAvailable(message) | BridgeError::OperationFailed(message) => {
            TransferError::Transport(message)
        }
        BridgeError::Io(e) => TransferError::Transport(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::CollectionId;
    use mockall::mock;

    mock! {
        Mover {}

        #[async_trait]
        impl TransferService for Mover {
            async fn move_records(&self, request: &TransferRequest) -> BridgeResult<TransferResult>;
        }
    }

    fn request(ids: Vec<i64>) -> TransferRequest {
        TransferRequest::new(ids, CollectionId::new("origin"), CollectionId::new("target"))
    }

    #[tokio::test]
    async fn test_success_passes_result_through() {
        let mut mover = MockMover::new();
        mover
            .expect_move_records()
            .times(1)
            .returning(|_| Ok(TransferResult::new(2, 1)));

        let executor = TransferExecutor::new(Arc::new(mover));
        let result = executor.execute(&request(vec![1, 2, 3])).await.unwrap();
        assert_eq!(result, TransferResult::new(2, 1));
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_collaborator() {
        let mut mover = MockMover::new();
        mover.expect_move_records().times(0);

        let executor = TransferExecutor::new(Arc::new(mover));
        let err = executor.execute(&request(vec![])).await.unwrap_err();
        assert!(matches!(err, TransferError::Rejected(_)));

        let same = TransferRequest::new(
            vec![1],
            CollectionId::new("origin"),
            CollectionId::new("origin"),
        );
        assert!(matches!(
            executor.execute(&same).await,
            Err(TransferError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_single_attempt_on_transport_failure() {
        let mut mover = MockMover::new();
        mover
            .expect_move_records()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".into())));

        let executor = TransferExecutor::new(Arc::new(mover));
        let err = executor.execute(&request(vec![1])).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(BridgeError::Rejected("bad".into())),
            TransferError::Rejected("bad".into())
        );
        assert_eq!(
            classify(BridgeError::NotFound("gone".into())),
            TransferError::NotFound("gone".into())
        );
        assert!(classify(BridgeError::NotAvailable("offline".into())).is_retryable());
    }
}
