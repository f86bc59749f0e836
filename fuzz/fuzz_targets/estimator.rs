#![no_main]

use fast_hyperloglog::HyperLogLog;
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let b = 4 + data[0] % 13;
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data[1..].split_at(split_index.min(data.len() - 1));

    let mut estimator1 = HyperLogLog::new(b).unwrap();
    for chunk in first_half.chunks(4) {
        estimator1.add(chunk);
        assert!(estimator1.count() > 0);
        assert!(estimator1.size_of() > 0);
    }

    let mut estimator2 = HyperLogLog::new(b).unwrap();
    estimator2.add_le_bytes::<u32>(second_half);

    let additions = estimator1.additions() + estimator2.additions();
    estimator1.merge(&estimator2).unwrap();
    assert_eq!(estimator1.additions(), additions);

    let restored = HyperLogLog::from_bytes(&estimator1.to_bytes()).unwrap();
    assert_eq!(restored, estimator1);
});
