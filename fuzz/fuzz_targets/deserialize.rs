#![no_main]

use fast_hyperloglog::HyperLogLog;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut estimator) = HyperLogLog::from_bytes(data) {
        let bytes = estimator.to_bytes();
        assert_eq!(HyperLogLog::from_bytes(&bytes).unwrap(), estimator);
        estimator.add(&1u64);
        assert!(estimator.count() > 0);
    }
    if let Ok(estimator) = serde_json::from_slice::<HyperLogLog>(data) {
        assert_eq!(HyperLogLog::from_bytes(&estimator.to_bytes()).unwrap(), estimator);
    }
});
