use surety_common::{
    error::Result, Amount, FlightKey, FlightState, Identity, OracleIndex, StatusCode, SuretyEvent,
};

use crate::{
    core::escrow::DepositSource, FlightRecord, FlightStatusRequest, ResponseOutcome, Surety,
};

impl Surety {
    /// Registers an oracle against `fee` and assigns its three indexes.
    pub async fn register_oracle(&self, candidate: &Identity, fee: Amount) -> Result<[OracleIndex; 3]> {
        self.mutate(|tx| {
            tx.state.escrow.check_deposit(DepositSource::OracleFee, fee)?;
            let indexes = tx.state.oracles.register(candidate, fee, &mut *tx.indexes)?;
            tx.state.escrow.deposit(DepositSource::OracleFee, fee)?;

            tracing::info!(target: "consensus", "🔮 Oracle {} registered with indexes {:?}", candidate, indexes);
            tx.emit(SuretyEvent::OracleRegistered {
                oracle: candidate.clone(),
                indexes,
            });
            Ok(indexes)
        })
        .await
    }

    pub async fn oracle_indexes(&self, oracle: &Identity) -> Result<[OracleIndex; 3]> {
        self.read(|state| state.oracles.indexes_of(oracle)).await
    }

    /// Opens a status request for `flight` at a freshly drawn index and
    /// returns that index. Oracles holding it are expected to answer.
    pub async fn fetch_flight_status(&self, requester: &Identity, flight: &FlightKey) -> Result<OracleIndex> {
        self.mutate(|tx| {
            let bound = tx.state.oracles.index_bound();
            let index = tx.indexes.next_index(requester, bound) % bound;
            tx.state.requests.open(requester, index, flight);

            tracing::info!(target: "consensus", "📡 Status of {} requested at index {}", flight, index);
            tx.emit(SuretyEvent::OracleRequest {
                index,
                flight: flight.clone(),
            });
            Ok(index)
        })
        .await
    }

    /// Counts `oracle`'s report of `status` for the request at `index`.
    ///
    /// Finalizes the flight once enough oracles agree and credits insurees
    /// when the airline is at fault. Duplicate and late reports succeed
    /// without effect.
    pub async fn submit_oracle_response(
        &self,
        oracle: &Identity,
        index: OracleIndex,
        flight: &FlightKey,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        self.mutate(|tx| {
            tx.state.oracles.check_index(oracle, index)?;
            let outcome = tx.state.requests.preview(oracle, index, flight, status)?;
            let credit = match outcome {
                ResponseOutcome::Finalized { status } if status.is_airline_fault() => {
                    Some(tx.state.escrow.plan_credit(flight)?)
                }
                _ => None,
            };
            let outcome = tx.state.requests.respond(oracle, index, flight, status)?;

            match outcome {
                ResponseOutcome::Counted { votes, required } => {
                    tracing::info!(
                        target: "consensus",
                        "📨 {} reported {} for {} ({}/{})",
                        oracle, status, flight, votes, required
                    );
                    tx.emit(report(oracle, index, flight, status));
                }
                ResponseOutcome::Finalized { status } => {
                    tracing::info!(target: "consensus", "⚖️ {} finalized as {}", flight, status);
                    tx.emit(report(oracle, index, flight, status));
                    tx.emit(SuretyEvent::FlightStatusInfo {
                        flight: flight.clone(),
                        status,
                    });
                    if let Some(plan) = credit {
                        tx.apply_credit(flight, plan);
                    }
                }
                ResponseOutcome::Duplicate => {
                    tracing::debug!(target: "consensus", "🔁 Duplicate report from {} on {}", oracle, flight);
                }
                ResponseOutcome::Late => {
                    tracing::debug!(target: "consensus", "⌛ Late report from {} on {}", oracle, flight);
                }
            }
            Ok(outcome)
        })
        .await
    }

    /// Consensus state and latest status, read under one lock.
    pub async fn flight_record(&self, flight: &FlightKey) -> FlightRecord {
        self.read(|state| state.requests.record(flight)).await
    }

    pub async fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.read(|state| state.requests.flight_status(flight)).await
    }

    pub async fn flight_state(&self, flight: &FlightKey) -> FlightState {
        self.read(|state| state.requests.flight_state(flight)).await
    }

    pub async fn request(&self, index: OracleIndex, flight: &FlightKey) -> Option<FlightStatusRequest> {
        self.read(|state| state.requests.request(index, flight).cloned())
            .await
    }

    pub async fn oracle_count(&self) -> usize {
        self.read(|state| state.oracles.len()).await
    }
}

fn report(oracle: &Identity, index: OracleIndex, flight: &FlightKey, status: StatusCode) -> SuretyEvent {
    SuretyEvent::OracleReport {
        oracle: oracle.clone(),
        index,
        flight: flight.clone(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use surety_common::{error::SuretyError, FlightKey, FlightState, StatusCode, SuretyConfig, UNIT};

    use crate::{ResponseOutcome, SequenceIndexSource, Surety};

    fn engine(indexes: &[u8]) -> Surety {
        Surety::with_index_source(
            SuretyConfig::default(),
            Box::new(SequenceIndexSource::new(indexes.iter().copied())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_oracle_requires_fee() {
        let surety = engine(&[1, 2, 3]);
        let err = surety.register_oracle(&"o1".into(), UNIT / 2).await.unwrap_err();
        assert!(matches!(err, SuretyError::InsufficientFee { .. }));
        assert!(matches!(
            surety.oracle_indexes(&"o1".into()).await,
            Err(SuretyError::OracleNotRegistered(_))
        ));

        assert_eq!(surety.register_oracle(&"o1".into(), UNIT).await.unwrap(), [1, 2, 3]);
        assert_eq!(surety.oracle_indexes(&"o1".into()).await.unwrap(), [1, 2, 3]);
        assert_eq!(surety.vault().await.oracle_fees, UNIT);
    }

    #[tokio::test]
    async fn test_foreign_index_never_counts() {
        // Three oracles holding {1,2,3}, then request index 7.
        let surety = engine(&[1, 2, 3, 1, 2, 3, 1, 2, 3, 7]);
        for id in ["o1", "o2", "o3"] {
            surety.register_oracle(&id.into(), UNIT).await.unwrap();
        }
        let flight = FlightKey::new(surety.config().first_airline.clone(), "TEST", 42);
        assert_eq!(surety.fetch_flight_status(&"pax".into(), &flight).await.unwrap(), 7);

        let err = surety
            .submit_oracle_response(&"o1".into(), 7, &flight, StatusCode::OnTime)
            .await
            .unwrap_err();
        assert!(matches!(err, SuretyError::IndexMismatch { index: 7, .. }));
        assert_eq!(
            surety.request(7, &flight).await.unwrap().votes_for(StatusCode::OnTime),
            0
        );
    }

    #[tokio::test]
    async fn test_response_without_request() {
        let surety = engine(&[1, 2, 3]);
        surety.register_oracle(&"o1".into(), UNIT).await.unwrap();
        let flight = FlightKey::new("air", "TEST", 42);
        let err = surety
            .submit_oracle_response(&"o1".into(), 1, &flight, StatusCode::OnTime)
            .await
            .unwrap_err();
        assert!(matches!(err, SuretyError::NoSuchRequest(_)));
    }

    #[tokio::test]
    async fn test_on_time_finalizes_without_credit() {
        let surety = engine(&[1, 2, 3, 1, 2, 3, 1, 2, 3, 2]);
        for id in ["o1", "o2", "o3"] {
            surety.register_oracle(&id.into(), UNIT).await.unwrap();
        }
        let flight = FlightKey::new(surety.config().first_airline.clone(), "TEST", 42);
        let index = surety.fetch_flight_status(&"pax".into(), &flight).await.unwrap();

        for id in ["o1", "o2"] {
            let outcome = surety
                .submit_oracle_response(&id.into(), index, &flight, StatusCode::OnTime)
                .await
                .unwrap();
            assert!(matches!(outcome, ResponseOutcome::Counted { .. }));
        }
        assert_eq!(surety.flight_state(&flight).await, FlightState::Requested);

        let outcome = surety
            .submit_oracle_response(&"o3".into(), index, &flight, StatusCode::OnTime)
            .await
            .unwrap();
        assert_eq!(outcome, ResponseOutcome::Finalized { status: StatusCode::OnTime });
        assert_eq!(surety.flight_status(&flight).await, Some(StatusCode::OnTime));
        assert_eq!(surety.vault().await.paid_out, 0);
    }
}
