use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rural_aqi::{
    AqiConverter, DirectionMetric, Pollutant, SpatialWeightEngine, WeatherSnapshot,
    WeightedCandidate,
};

fn candidates() -> Vec<WeightedCandidate> {
    (1..=5)
        .map(|i| WeightedCandidate {
            distance_km: 12.0 * i as f64,
            value: 40.0 + 7.0 * i as f64,
            weather: Some(WeatherSnapshot {
                temperature: Some(28.0 + i as f64),
                wind_speed: Some(6.0 + i as f64),
                wind_direction: Some(30.0 * i as f64),
                ..Default::default()
            }),
        })
        .collect()
}

fn bench_aqi(c: &mut Criterion) {
    let converter = AqiConverter::default();
    c.bench_function("sub_index", |b| {
        b.iter(|| converter.sub_index(black_box(Pollutant::Pm25), black_box(77.3)))
    });
    c.bench_function("invert", |b| {
        b.iter(|| converter.invert(black_box(Pollutant::So2), black_box(233)))
    });
}

fn bench_weights(c: &mut Criterion) {
    let candidates = candidates();
    let query = WeatherSnapshot {
        temperature: Some(30.0),
        wind_speed: Some(8.0),
        wind_direction: Some(200.0),
        ..Default::default()
    };
    let weather_engine = SpatialWeightEngine::distance_weather(1.0, 1.0, DirectionMetric::Linear, 10.0);
    let idw_engine = SpatialWeightEngine::inverse_distance();

    c.bench_function("distance_weather_weights", |b| {
        b.iter(|| weather_engine.weights(black_box(&candidates), Some(black_box(&query))))
    });
    c.bench_function("inverse_distance_weights", |b| {
        b.iter(|| idw_engine.weights(black_box(&candidates), None))
    });
}

criterion_group!(benches, bench_aqi, bench_weights);
criterion_main!(benches);
