use buffer::ByteBuffer;
use codec::{
    KeyRange, ProcessingInfo, ProcessingState, RangeKey, RefValue, StagingValue, Uid, ValueMeta,
    ValueSerdeRegistry,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const N_RECORDS: usize = 10_000;

fn range_keys() -> Vec<Vec<u8>> {
    (0..N_RECORDS as i64)
        .map(|i| {
            let mut buf = ByteBuffer::with_capacity(RangeKey::SERIALIZED_SIZE);
            let range = KeyRange::new(i * 10, i * 10 + 10).unwrap();
            RangeKey::new(Uid::from_u32(1), range)
                .serialize(&mut buf)
                .unwrap();
            buf.to_vec()
        })
        .collect()
}

fn range_locate_benchmark(c: &mut Criterion) {
    let keys = range_keys();
    let uid = Uid::from_u32(1);
    c.bench_function("range_locate_10k", |b| {
        b.iter(|| {
            let mut within = 0;
            for key in &keys {
                if RangeKey::locate(key, &uid, black_box(5_005)).unwrap()
                    == codec::RangeLocation::Within
                {
                    within += 1;
                }
            }
            assert_eq!(within, 1);
        });
    });
}

fn processing_info_filter_benchmark(c: &mut Criterion) {
    let records: Vec<Vec<u8>> = (0..N_RECORDS as i64)
        .map(|i| {
            let mut buf = ByteBuffer::with_capacity(64);
            let mut info = ProcessingInfo::new(i, i, ProcessingState::Complete);
            info.last_accessed_time_ms = i;
            info.serialize(&mut buf).unwrap();
            buf.to_vec()
        })
        .collect();
    let threshold = (N_RECORDS as i64 / 2).to_be_bytes();

    c.bench_function("processing_info_accessed_after_10k", |b| {
        b.iter(|| {
            records
                .iter()
                .filter(|r| ProcessingInfo::was_accessed_after(r, black_box(&threshold)).unwrap())
                .count()
        });
    });
}

fn value_meta_clone_benchmark(c: &mut Criterion) {
    let mut buf = ByteBuffer::with_capacity(ValueMeta::SERIALIZED_SIZE);
    ValueMeta::new(0, 1_000).unwrap().serialize(&mut buf).unwrap();
    let source = buf.to_vec();

    c.bench_function("value_meta_clone_with_increment", |b| {
        let mut dest = ByteBuffer::with_capacity(ValueMeta::SERIALIZED_SIZE);
        b.iter(|| {
            dest.clear();
            ValueMeta::clone_with_increment(black_box(&source), &mut dest).unwrap()
        });
    });
}

fn staging_header_benchmark(c: &mut Criterion) {
    let registry = ValueSerdeRegistry::with_defaults();
    let value = RefValue::string("x".repeat(100));
    let staged = StagingValue::from_value(&registry, &value).unwrap();
    let mut buf = ByteBuffer::with_capacity(staged.serialized_size());
    staged.serialize(&mut buf).unwrap();
    let bytes = buf.to_vec();

    c.bench_function("staging_extract_header", |b| {
        b.iter(|| {
            let bytes = black_box(bytes.as_slice());
            (
                StagingValue::extract_type_id(bytes).unwrap(),
                StagingValue::extract_hash(bytes).unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    range_locate_benchmark,
    processing_info_filter_benchmark,
    value_meta_clone_benchmark,
    staging_header_benchmark
);
criterion_main!(benches);
