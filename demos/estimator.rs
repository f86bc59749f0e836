use fast_hyperloglog::{HyperLogLog, HyperLogLog14};

fn main() {
    let mut estimator1 = HyperLogLog::default();
    for i in 0..10 {
        estimator1.add(&i);
    }
    println!("estimator1 count = {}", estimator1.count());

    let mut estimator2 = HyperLogLog::default();
    for i in 10..15 {
        estimator2.add(&i);
    }
    println!("estimator2 count = {}", estimator2.count());

    estimator1.merge(&estimator2).unwrap();
    println!("merged count = {}", estimator1.count());
    println!("merged estimator = {:?}", estimator1);

    let bytes = estimator1.to_bytes();
    let restored = HyperLogLog::from_bytes(&bytes).unwrap();
    println!("restored count = {} ({} bytes)", restored.count(), bytes.len());

    let hashes: Vec<u64> = (0..100_000u64).map(fast_hyperloglog::mix64).collect();
    println!("batch count = {}", HyperLogLog14::count(&hashes));
}
