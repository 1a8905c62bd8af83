use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use surety_common::{
    error::{Result, SuretyError},
    FlightKey, FlightState, Identity, OracleIndex, RequestKey, StatusCode,
};

/// Responses collected for one (index, flight) request.
#[derive(Debug, Clone, Serialize)]
pub struct FlightStatusRequest {
    pub key: RequestKey,
    pub requester: Identity,
    /// Status code -> oracles that reported it.
    pub responses: BTreeMap<StatusCode, BTreeSet<Identity>>,
    /// Set once a code reaches the agreement threshold.
    pub finalized: Option<StatusCode>,
}

impl FlightStatusRequest {
    fn new(key: RequestKey, requester: Identity) -> Self {
        Self {
            key,
            requester,
            responses: BTreeMap::new(),
            finalized: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.finalized.is_none()
    }

    pub fn has_responded(&self, oracle: &Identity) -> bool {
        self.responses.values().any(|set| set.contains(oracle))
    }

    pub fn votes_for(&self, status: StatusCode) -> usize {
        self.responses.get(&status).map(BTreeSet::len).unwrap_or(0)
    }
}

/// Consensus view of one flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlightRecord {
    pub state: FlightState,
    /// Latest finalized status.
    pub status: Option<StatusCode>,
}

impl FlightRecord {
    const UNREQUESTED: FlightRecord = FlightRecord {
        state: FlightState::NoRequest,
        status: None,
    };
}

/// What a submitted response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// Counted; the code now has `votes` of the `required` responses.
    Counted { votes: u32, required: u32 },
    /// This response completed the agreement.
    Finalized { status: StatusCode },
    /// The oracle already answered this request.
    Duplicate,
    /// The request was already finalized.
    Late,
}

/// Open and finalized status requests plus per-flight consensus state.
#[derive(Debug, Clone)]
pub struct RequestPool {
    requests: HashMap<RequestKey, FlightStatusRequest>,
    /// Indexes with an open request, per flight.
    open: HashMap<FlightKey, BTreeSet<OracleIndex>>,
    flights: HashMap<FlightKey, FlightRecord>,
    min_responses: u32,
}

impl RequestPool {
    pub fn new(min_responses: u32) -> Self {
        Self {
            requests: HashMap::new(),
            open: HashMap::new(),
            flights: HashMap::new(),
            min_responses,
        }
    }

    /// Opens a request for `index`. An open request at the same key keeps its
    /// responses; a finalized one is replaced by a fresh request.
    pub fn open(&mut self, requester: &Identity, index: OracleIndex, flight: &FlightKey) {
        let key = RequestKey::new(index, flight.clone());
        let reopen = self
            .requests
            .get(&key)
            .map(|r| !r.is_open())
            .unwrap_or(true);
        if reopen {
            self.requests
                .insert(key.clone(), FlightStatusRequest::new(key, requester.clone()));
        }
        self.open.entry(flight.clone()).or_default().insert(index);

        let record = self
            .flights
            .entry(flight.clone())
            .or_insert(FlightRecord::UNREQUESTED);
        record.state = FlightState::Requested;
    }

    /// What `respond` would do, without recording anything.
    pub fn preview(
        &self,
        oracle: &Identity,
        index: OracleIndex,
        flight: &FlightKey,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        let key = RequestKey::new(index, flight.clone());
        let request = self
            .requests
            .get(&key)
            .ok_or_else(|| SuretyError::NoSuchRequest(key.clone()))?;

        if !request.is_open() {
            return Ok(ResponseOutcome::Late);
        }
        if request.has_responded(oracle) {
            return Ok(ResponseOutcome::Duplicate);
        }

        let votes = request.votes_for(status) as u32 + 1;
        if votes < self.min_responses {
            return Ok(ResponseOutcome::Counted {
                votes,
                required: self.min_responses,
            });
        }
        Ok(ResponseOutcome::Finalized { status })
    }

    /// Counts `oracle`'s report. Index ownership is checked by the caller.
    pub fn respond(
        &mut self,
        oracle: &Identity,
        index: OracleIndex,
        flight: &FlightKey,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        let outcome = self.preview(oracle, index, flight, status)?;
        if !matches!(
            outcome,
            ResponseOutcome::Counted { .. } | ResponseOutcome::Finalized { .. }
        ) {
            return Ok(outcome);
        }

        if let Some(request) = self.requests.get_mut(&RequestKey::new(index, flight.clone())) {
            request
                .responses
                .entry(status)
                .or_default()
                .insert(oracle.clone());
        }
        if let ResponseOutcome::Finalized { status } = outcome {
            self.finalize(flight, status);
        }
        Ok(outcome)
    }

    /// Closes the flight's open requests and records the status.
    fn finalize(&mut self, flight: &FlightKey, status: StatusCode) {
        for index in self.open.remove(flight).unwrap_or_default() {
            if let Some(request) = self.requests.get_mut(&RequestKey::new(index, flight.clone())) {
                request.finalized = Some(status);
            }
        }
        self.flights.insert(
            flight.clone(),
            FlightRecord {
                state: FlightState::Finalized,
                status: Some(status),
            },
        );
    }

    /// State and latest status of a flight, read together.
    pub fn record(&self, flight: &FlightKey) -> FlightRecord {
        self.flights
            .get(flight)
            .copied()
            .unwrap_or(FlightRecord::UNREQUESTED)
    }

    pub fn flight_state(&self, flight: &FlightKey) -> FlightState {
        self.flights
            .get(flight)
            .map(|r| r.state)
            .unwrap_or(FlightState::NoRequest)
    }

    pub fn flight_status(&self, flight: &FlightKey) -> Option<StatusCode> {
        self.flights.get(flight).and_then(|r| r.status)
    }

    pub fn request(&self, index: OracleIndex, flight: &FlightKey) -> Option<&FlightStatusRequest> {
        self.requests.get(&RequestKey::new(index, flight.clone()))
    }

    pub fn min_responses(&self) -> u32 {
        self.min_responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> FlightKey {
        FlightKey::new("air", "ND1309", 1_700_000_000)
    }

    #[test]
    fn test_no_request() {
        let mut pool = RequestPool::new(3);
        assert_eq!(pool.flight_state(&flight()), FlightState::NoRequest);
        assert!(matches!(
            pool.respond(&"o1".into(), 2, &flight(), StatusCode::OnTime),
            Err(SuretyError::NoSuchRequest(_))
        ));
    }

    #[test]
    fn test_finalizes_on_third_matching_response() {
        let mut pool = RequestPool::new(3);
        pool.open(&"requester".into(), 2, &flight());
        assert_eq!(pool.flight_state(&flight()), FlightState::Requested);

        assert_eq!(
            pool.respond(&"o1".into(), 2, &flight(), StatusCode::LateAirline).unwrap(),
            ResponseOutcome::Counted { votes: 1, required: 3 }
        );
        // Conflicting report does not help the leading code.
        pool.respond(&"o2".into(), 2, &flight(), StatusCode::OnTime).unwrap();
        pool.respond(&"o3".into(), 2, &flight(), StatusCode::LateAirline).unwrap();
        assert_eq!(pool.flight_state(&flight()), FlightState::Requested);

        assert_eq!(
            pool.respond(&"o4".into(), 2, &flight(), StatusCode::LateAirline).unwrap(),
            ResponseOutcome::Finalized { status: StatusCode::LateAirline }
        );
        assert_eq!(pool.flight_state(&flight()), FlightState::Finalized);
        assert_eq!(pool.flight_status(&flight()), Some(StatusCode::LateAirline));

        assert_eq!(
            pool.respond(&"o5".into(), 2, &flight(), StatusCode::OnTime).unwrap(),
            ResponseOutcome::Late
        );
        assert_eq!(pool.flight_status(&flight()), Some(StatusCode::LateAirline));
    }

    #[test]
    fn test_duplicate_response_ignored() {
        let mut pool = RequestPool::new(2);
        pool.open(&"requester".into(), 5, &flight());

        pool.respond(&"o1".into(), 5, &flight(), StatusCode::OnTime).unwrap();
        assert_eq!(
            pool.respond(&"o1".into(), 5, &flight(), StatusCode::OnTime).unwrap(),
            ResponseOutcome::Duplicate
        );
        assert_eq!(
            pool.respond(&"o1".into(), 5, &flight(), StatusCode::LateOther).unwrap(),
            ResponseOutcome::Duplicate
        );
        assert_eq!(pool.request(5, &flight()).unwrap().votes_for(StatusCode::OnTime), 1);
        assert_eq!(pool.flight_state(&flight()), FlightState::Requested);
    }

    #[test]
    fn test_reopen_keeps_open_responses_and_resets_finalized() {
        let mut pool = RequestPool::new(2);
        pool.open(&"r".into(), 1, &flight());
        pool.respond(&"o1".into(), 1, &flight(), StatusCode::OnTime).unwrap();

        pool.open(&"r".into(), 1, &flight());
        assert_eq!(pool.request(1, &flight()).unwrap().votes_for(StatusCode::OnTime), 1);

        pool.respond(&"o2".into(), 1, &flight(), StatusCode::OnTime).unwrap();
        assert_eq!(pool.flight_state(&flight()), FlightState::Finalized);

        pool.open(&"r".into(), 1, &flight());
        assert_eq!(pool.flight_state(&flight()), FlightState::Requested);
        assert!(pool.request(1, &flight()).unwrap().is_open());
        assert_eq!(pool.request(1, &flight()).unwrap().votes_for(StatusCode::OnTime), 0);
        // The last finalized status survives until the next finalization.
        assert_eq!(pool.flight_status(&flight()), Some(StatusCode::OnTime));
    }

    #[test]
    fn test_finalization_closes_sibling_requests() {
        let mut pool = RequestPool::new(1);
        pool.open(&"r".into(), 1, &flight());
        pool.open(&"r".into(), 4, &flight());

        pool.respond(&"o1".into(), 1, &flight(), StatusCode::LateWeather).unwrap();
        assert_eq!(
            pool.respond(&"o2".into(), 4, &flight(), StatusCode::OnTime).unwrap(),
            ResponseOutcome::Late
        );
        assert_eq!(pool.flight_status(&flight()), Some(StatusCode::LateWeather));
    }

    #[test]
    fn test_finalization_leaves_other_flights_open() {
        let other = FlightKey::new("air", "ND2000", 1_700_000_000);
        let mut pool = RequestPool::new(1);
        pool.open(&"r".into(), 3, &flight());
        pool.open(&"r".into(), 3, &other);

        pool.respond(&"o1".into(), 3, &flight(), StatusCode::OnTime).unwrap();
        assert!(pool.request(3, &other).unwrap().is_open());
        assert_eq!(pool.record(&other).state, FlightState::Requested);

        // Reopening after finalization tracks the fresh request again.
        pool.open(&"r".into(), 3, &flight());
        pool.respond(&"o1".into(), 3, &flight(), StatusCode::LateAirline).unwrap();
        assert!(!pool.request(3, &flight()).unwrap().is_open());
    }

    #[test]
    fn test_preview_records_nothing() {
        let mut pool = RequestPool::new(1);
        pool.open(&"r".into(), 2, &flight());

        assert_eq!(
            pool.preview(&"o1".into(), 2, &flight(), StatusCode::LateAirline).unwrap(),
            ResponseOutcome::Finalized { status: StatusCode::LateAirline }
        );
        assert_eq!(
            pool.record(&flight()),
            FlightRecord { state: FlightState::Requested, status: None }
        );
        assert_eq!(pool.request(2, &flight()).unwrap().votes_for(StatusCode::LateAirline), 0);
    }
}
