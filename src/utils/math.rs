//! 수학 관련 유틸리티
//!
//! 수량 배분, 변동성 계산 함수 제공

use statrs::statistics::Statistics;

/// 총 수량을 n개의 균등 슬라이스로 분할
///
/// 나머지는 앞쪽 슬라이스부터 1단위씩 배분하여 합이 정확히 total이 되도록 함
pub fn split_even(total: u64, num_slices: usize) -> Vec<u64> {
  if num_slices == 0 {
    return Vec::new();
  }

  let n = num_slices as u64;
  let base = total / n;
  let remainder = total % n;

  (0..num_slices)
    .map(|i| if (i as u64) < remainder { base + 1 } else { base })
    .collect()
}

/// 가중치 비례 수량 배분 (최대 잉여법)
///
/// 각 슬라이스에 정수 수량을 배분하되 합이 정확히 total이 되도록 함
pub fn allocate_proportional(total: u64, weights: &[f64]) -> Vec<u64> {
  if weights.is_empty() {
    return Vec::new();
  }

  let weight_sum: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
  if weight_sum <= 0.0 {
    return split_even(total, weights.len());
  }

  // 정수 부분 먼저 배분
  let mut sizes: Vec<u64> = Vec::with_capacity(weights.len());
  let mut fractions: Vec<(usize, f64)> = Vec::with_capacity(weights.len());
  let mut allocated: u64 = 0;

  for (i, w) in weights.iter().enumerate() {
    let w = if w.is_finite() && *w > 0.0 { *w } else { 0.0 };
    let exact = total as f64 * w / weight_sum;
    let floor = exact.floor() as u64;
    sizes.push(floor);
    fractions.push((i, exact - floor as f64));
    allocated += floor;
  }

  // 잔여 수량은 소수부가 큰 슬라이스부터 배분
  let mut remaining = total.saturating_sub(allocated);
  fractions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

  let mut idx = 0;
  while remaining > 0 {
    let (slot, _) = fractions[idx % fractions.len()];
    sizes[slot] += 1;
    remaining -= 1;
    idx += 1;
  }

  sizes
}

/// 평균 계산
pub fn average(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    return None;
  }

  Some(values.iter().copied().mean())
}

/// 가격 시계열의 수익률 변동성 (수익률 표준 편차)
pub fn returns_volatility(prices: &[f64]) -> Option<f64> {
  if prices.len() < 2 {
    return None;
  }

  let returns: Vec<f64> = prices
    .windows(2)
    .filter(|w| w[0] > 0.0)
    .map(|w| (w[1] - w[0]) / w[0])
    .collect();

  if returns.len() < 2 {
    return None;
  }

  Some(returns.iter().copied().std_dev())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_even_exact_sum() {
    let sizes = split_even(10000, 20);
    assert_eq!(sizes.len(), 20);
    assert_eq!(sizes.iter().sum::<u64>(), 10000);
    assert!(sizes.iter().all(|&s| s == 500));
  }

  #[test]
  fn test_split_even_remainder_front_loaded() {
    let sizes = split_even(10, 3);
    assert_eq!(sizes, vec![4, 3, 3]);
  }

  #[test]
  fn test_allocate_proportional_exact_sum() {
    let weights = vec![1.0, 2.0, 3.0, 4.0];
    let sizes = allocate_proportional(1000, &weights);
    assert_eq!(sizes.iter().sum::<u64>(), 1000);
    assert!(sizes[3] > sizes[0]);
  }

  #[test]
  fn test_allocate_proportional_zero_weights() {
    let weights = vec![0.0, 0.0, 0.0];
    let sizes = allocate_proportional(9, &weights);
    assert_eq!(sizes.iter().sum::<u64>(), 9);
  }

  #[test]
  fn test_returns_volatility() {
    let flat = vec![100.0, 100.0, 100.0, 100.0];
    assert!(returns_volatility(&flat).unwrap() < 1e-12);

    let choppy = vec![100.0, 110.0, 95.0, 120.0];
    assert!(returns_volatility(&choppy).unwrap() > 0.01);
  }
}
