/// Deterministic development embedding.
///
/// Derived only from the text's UTF-16 length and code-unit sum, so equal
/// texts always map to the same unit vector and no model is needed. Texts
/// with the same length and character sum collide by construction.
pub fn mock_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let (len, char_sum) = text
        .encode_utf16()
        .fold((0u64, 0u64), |(len, sum), unit| (len + 1, sum + u64::from(unit)));
    let seed = (len % 100) as f64;
    let offset = char_sum as f64 / 1000.0;

    let raw: Vec<f64> = (0..dimensions)
        .map(|i| {
            let i = i as f64;
            ((seed + i + offset).sin() * (i / 10.0).cos()).clamp(-1.0, 1.0)
        })
        .collect();

    let magnitude = raw.iter().map(|v| v * v).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return vec![0.0; dimensions];
    }

    raw.into_iter().map(|v| (v / magnitude) as f32).collect()
}
