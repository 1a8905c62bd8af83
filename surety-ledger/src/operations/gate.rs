use surety_common::{error::Result, Identity, SuretyEvent};

use crate::Surety;

impl Surety {
    pub async fn is_operational(&self) -> bool {
        self.read(|state| state.gate.is_operational()).await
    }

    /// Opens or closes the gate and returns the committed flag. Only the
    /// administrator may call this, and it works while the gate is closed.
    pub async fn set_operational(&self, caller: &Identity, operational: bool) -> Result<bool> {
        self.transact(|tx| {
            if tx.state.gate.set_operational(caller, operational)? {
                if operational {
                    tracing::info!("🟢 Operations resumed by {}", caller);
                } else {
                    tracing::warn!("🛑 Operations suspended by {}", caller);
                }
                tx.emit(SuretyEvent::OperationalChanged {
                    operational,
                    by: caller.clone(),
                });
            }
            Ok(tx.state.gate.is_operational())
        })
        .await
    }

    /// Returns whether `target` is authorized once the call commits.
    pub async fn authorize_caller(&self, caller: &Identity, target: &Identity) -> Result<bool> {
        self.transact(|tx| {
            if tx.state.gate.authorize(caller, target)? {
                tracing::info!("🔑 {} authorized by {}", target, caller);
            }
            Ok(tx.state.gate.is_authorized(target))
        })
        .await
    }

    /// Same as `authorize_caller`; the admin stays authorized regardless.
    pub async fn deauthorize_caller(&self, caller: &Identity, target: &Identity) -> Result<bool> {
        self.transact(|tx| {
            if tx.state.gate.deauthorize(caller, target)? {
                tracing::info!("🔒 {} deauthorized by {}", target, caller);
            }
            Ok(tx.state.gate.is_authorized(target))
        })
        .await
    }

    pub async fn is_authorized_caller(&self, caller: &Identity) -> bool {
        self.read(|state| state.gate.is_authorized(caller)).await
    }
}

#[cfg(test)]
mod tests {
    use surety_common::{
        error::{Result, SuretyError},
        units, FlightKey, Identity, StatusCode, SuretyConfig, UNIT,
    };

    use crate::{SequenceIndexSource, Surety};

    fn engine() -> Surety {
        Surety::with_index_source(
            SuretyConfig::default(),
            Box::new(SequenceIndexSource::new([0, 1, 2])),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_gate_blocks_mutations_until_reopened() {
        let surety = engine();
        let admin = surety.config().admin.clone();
        let first = surety.config().first_airline.clone();

        assert!(!surety.set_operational(&admin, false).await.unwrap());
        assert!(!surety.is_operational().await);

        let err = surety.add_funding(&first, 1).await.unwrap_err();
        assert!(matches!(err, SuretyError::OperationsSuspended));

        surety.set_operational(&admin, true).await.unwrap();
        surety.add_funding(&first, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_admin_cannot_toggle() {
        let surety = engine();
        let err = surety
            .set_operational(&"mallory".into(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SuretyError::Unauthorized(_)));
        assert!(surety.is_operational().await);
    }

    #[tokio::test]
    async fn test_authorize_and_deauthorize() {
        let surety = engine();
        let admin = surety.config().admin.clone();
        let app = Identity::from("dapp");

        assert!(surety.authorize_caller(&admin, &app).await.unwrap());
        assert!(surety.is_authorized_caller(&app).await);
        assert!(!surety.deauthorize_caller(&admin, &app).await.unwrap());
        assert!(!surety.is_authorized_caller(&app).await);
        assert!(surety.deauthorize_caller(&admin, &admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_gate_rejects_every_mutation_without_effect() {
        let surety = Surety::with_index_source(
            SuretyConfig::default(),
            Box::new(SequenceIndexSource::new([1, 2, 3, 1, 2, 3, 1, 2, 3, 2])),
        )
        .unwrap();
        let admin = surety.config().admin.clone();
        let first = surety.config().first_airline.clone();
        let pax = Identity::from("pax");
        let open = FlightKey::new(first.clone(), "ND1309", 1_700_000_000);
        let settled = FlightKey::new(first.clone(), "ND0001", 1_700_000_000);

        surety.add_funding(&first, units(10)).await.unwrap();
        for id in ["o1", "o2", "o3"] {
            surety.register_oracle(&id.into(), UNIT).await.unwrap();
        }
        surety.purchase_policy(&pax, &open, UNIT).await.unwrap();
        surety.purchase_policy(&pax, &settled, UNIT).await.unwrap();
        surety.credit_insurees(&admin, &settled).await.unwrap();
        let index = surety.fetch_flight_status(&pax, &open).await.unwrap();

        assert!(!surety.set_operational(&admin, false).await.unwrap());
        let mut events = surety.subscribe();
        let vault = surety.vault().await;
        let credit = surety.credit_of(&pax).await;
        let policy = surety.policy(&pax, &open).await;
        let record = surety.flight_record(&open).await;

        let attempts: Vec<(&str, Result<()>)> = vec![
            (
                "register_airline",
                surety
                    .register_airline(&first, &"second".into(), "Second")
                    .await
                    .map(|_| ()),
            ),
            (
                "add_vote_to_airline",
                surety
                    .add_vote_to_airline(&first, &"second".into())
                    .await
                    .map(|_| ()),
            ),
            ("add_funding", surety.add_funding(&first, UNIT).await.map(|_| ())),
            ("purchase_policy", surety.purchase_policy(&"pax2".into(), &open, UNIT).await),
            ("withdraw", surety.withdraw(&pax).await.map(|_| ())),
            (
                "credit_insurees",
                surety.credit_insurees(&admin, &open).await.map(|_| ()),
            ),
            ("register_oracle", surety.register_oracle(&"o4".into(), UNIT).await.map(|_| ())),
            (
                "fetch_flight_status",
                surety.fetch_flight_status(&pax, &open).await.map(|_| ()),
            ),
            (
                "submit_oracle_response",
                surety
                    .submit_oracle_response(&"o1".into(), index, &open, StatusCode::LateAirline)
                    .await
                    .map(|_| ()),
            ),
        ];
        for (name, result) in attempts {
            assert!(
                matches!(result, Err(SuretyError::OperationsSuspended)),
                "{name} ran with the gate closed: {result:?}"
            );
        }

        assert_eq!(surety.registered_count().await, 1);
        assert!(!surety.is_airline_registered(&"second".into()).await);
        assert_eq!(surety.airline(&first).await.unwrap().funded, units(10));
        assert_eq!(surety.vault().await, vault);
        assert_eq!(surety.credit_of(&pax).await, credit);
        assert_eq!(surety.policy(&pax, &open).await, policy);
        assert_eq!(surety.policy(&"pax2".into(), &open).await, None);
        assert_eq!(surety.flight_record(&open).await, record);
        assert_eq!(surety.oracle_count().await, 3);
        assert_eq!(
            surety.request(index, &open).await.unwrap().votes_for(StatusCode::LateAirline),
            0
        );
        assert!(events.try_recv().is_err());
    }
}
