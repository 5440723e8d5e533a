//! Test assembly: picks operation kinds and a difficulty progression from a
//! rating value and delegates to the generator.
//!
//! Two fixed tables drive everything: the unlock thresholds (which kinds a
//! rating has access to; grows monotonically, never shrinks) and the
//! difficulty bands (a [min, max] difficulty window per rating bucket).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Exercise, OperationKind};
use crate::generator::generate;

/// Minimum rating at which each operation kind unlocks.
pub const UNLOCK_THRESHOLDS: [(OperationKind, i32); 12] = [
  (OperationKind::Addition, i32::MIN),
  (OperationKind::Subtraction, 450),
  (OperationKind::Multiplication, 550),
  (OperationKind::Percentage, 600),
  (OperationKind::Division, 700),
  (OperationKind::Power, 800),
  (OperationKind::SquareRoot, 900),
  (OperationKind::Fractions, 950),
  (OperationKind::Equation, 1000),
  (OperationKind::Factorization, 1100),
  (OperationKind::MentalMath, 1200),
  (OperationKind::Sequence, 1250),
];

/// Kinds unlocked at `rating`. Always contains at least addition.
pub fn unlocked_kinds(rating: i32) -> Vec<OperationKind> {
  UNLOCK_THRESHOLDS
    .iter()
    .filter(|(_, threshold)| rating >= *threshold)
    .map(|(kind, _)| *kind)
    .collect()
}

/// `[min, max]` difficulty window per rating bucket, six bands.
pub fn difficulty_band(rating: i32) -> (u8, u8) {
  if rating < 500 {
    (1, 3)
  } else if rating < 700 {
    (2, 4)
  } else if rating < 900 {
    (3, 5)
  } else if rating < 1100 {
    (4, 7)
  } else if rating < 1300 {
    (5, 8)
  } else {
    (6, 10)
  }
}

/// Difficulty for question `i` of `count`: a super-linear ramp through the
/// band, so the back half of a test is harder than a naive linear scale.
fn ramp_difficulty(band: (u8, u8), i: usize, count: usize) -> u8 {
  let (min_d, max_d) = band;
  if count == 0 {
    return min_d;
  }
  let p = i as f64 / count as f64;
  let stepped = min_d as f64 + (p * (max_d - min_d) as f64 * 1.5).floor();
  (stepped as u8).min(max_d)
}

/// Build an ordered sequence of exercises for a solo test.
/// `allowlist`, when present, restricts kinds further; if the intersection
/// with the unlocked set is empty, addition is substituted rather than
/// failing the caller.
pub fn assemble_test(
  rng: &mut impl Rng,
  rating: i32,
  count: usize,
  allowlist: Option<&[OperationKind]>,
) -> Vec<Exercise> {
  let unlocked = unlocked_kinds(rating);
  let allowed: Vec<OperationKind> = match allowlist {
    Some(list) => {
      let filtered: Vec<OperationKind> =
        unlocked.iter().copied().filter(|k| list.contains(k)).collect();
      if filtered.is_empty() { vec![OperationKind::Addition] } else { filtered }
    }
    None => unlocked,
  };
  let band = difficulty_band(rating);

  (0..count)
    .map(|i| {
      let kind = *allowed.choose(rng).unwrap_or(&OperationKind::Addition);
      generate(rng, kind, ramp_difficulty(band, i, count))
    })
    .collect()
}

/// Multiplayer variant: one shared sequence balanced for the pair by
/// averaging the two ratings before the kind/difficulty tables apply.
pub fn assemble_shared_test(
  rng: &mut impl Rng,
  rating_a: i32,
  rating_b: i32,
  count: usize,
) -> Vec<Exercise> {
  let midpoint = ((rating_a as i64 + rating_b as i64) / 2) as i32;
  assemble_test(rng, midpoint, count, None)
}

/// Focused-course variant: a caller-supplied kind subset at a nominal
/// difficulty, capped by the caller's rating band so weak players are never
/// assigned material they cannot reasonably attempt.
pub fn assemble_course(
  rng: &mut impl Rng,
  rating: i32,
  count: usize,
  kinds: &[OperationKind],
  requested_difficulty: u8,
) -> Vec<Exercise> {
  let pool: Vec<OperationKind> =
    if kinds.is_empty() { vec![OperationKind::Addition] } else { kinds.to_vec() };
  let cap = difficulty_band(rating).1;
  let difficulty = requested_difficulty.clamp(1, 10).min(cap);

  (0..count)
    .map(|_| {
      let kind = *pool.choose(rng).unwrap_or(&OperationKind::Addition);
      generate(rng, kind, difficulty)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn unlocks_grow_monotonically_with_rating() {
    let mut prev = 0;
    for rating in [0, 450, 550, 700, 900, 1100, 1300, 2500] {
      let kinds = unlocked_kinds(rating);
      assert!(kinds.contains(&OperationKind::Addition));
      assert!(kinds.len() >= prev, "allowlist shrank at {}", rating);
      prev = kinds.len();
    }
    assert_eq!(unlocked_kinds(2500).len(), 12);
    assert_eq!(unlocked_kinds(0), vec![OperationKind::Addition]);
  }

  #[test]
  fn assembled_test_stays_inside_the_band() {
    let mut rng = StdRng::seed_from_u64(3);
    for rating in [200, 600, 800, 1000, 1200, 1500] {
      let (min_d, max_d) = difficulty_band(rating);
      let test = assemble_test(&mut rng, rating, 20, None);
      assert_eq!(test.len(), 20);
      for ex in &test {
        assert!(ex.difficulty >= min_d && ex.difficulty <= max_d);
      }
    }
  }

  #[test]
  fn ramp_is_superlinear_and_capped() {
    let band = (4, 7);
    // i=10 of 20: p=0.5, 4 + floor(0.5*3*1.5) = 6; linear would give 5.
    assert_eq!(ramp_difficulty(band, 10, 20), 6);
    assert_eq!(ramp_difficulty(band, 0, 20), 4);
    assert_eq!(ramp_difficulty(band, 19, 20), 7);
    // Never exceeds the band max even at the tail.
    for i in 0..20 {
      assert!(ramp_difficulty(band, i, 20) <= 7);
    }
  }

  #[test]
  fn allowlist_restricts_but_never_empties() {
    let mut rng = StdRng::seed_from_u64(5);
    let test = assemble_test(&mut rng, 1500, 10, Some(&[OperationKind::Division]));
    assert!(test.iter().all(|e| e.kind == OperationKind::Division));

    // Locked-only allowlist degrades to addition instead of failing.
    let test = assemble_test(&mut rng, 0, 10, Some(&[OperationKind::Factorization]));
    assert!(test.iter().all(|e| e.kind == OperationKind::Addition));
  }

  #[test]
  fn only_unlocked_kinds_appear() {
    let mut rng = StdRng::seed_from_u64(7);
    let test = assemble_test(&mut rng, 480, 50, None);
    for ex in &test {
      assert!(
        matches!(ex.kind, OperationKind::Addition | OperationKind::Subtraction),
        "locked kind {:?} at rating 480",
        ex.kind
      );
    }
  }

  #[test]
  fn shared_test_uses_the_average_rating() {
    let mut rng = StdRng::seed_from_u64(9);
    // 200 and 1600 average to 900: band [4,7], kinds up to square root.
    let test = assemble_shared_test(&mut rng, 200, 1600, 20);
    let (min_d, max_d) = difficulty_band(900);
    for ex in &test {
      assert!(ex.difficulty >= min_d && ex.difficulty <= max_d);
      assert!(unlocked_kinds(900).contains(&ex.kind));
    }
  }

  #[test]
  fn course_caps_difficulty_by_rating() {
    let mut rng = StdRng::seed_from_u64(11);
    // A sub-500 player asking for difficulty 9 gets the band cap of 3.
    let course = assemble_course(&mut rng, 300, 10, &[OperationKind::Addition], 9);
    assert!(course.iter().all(|e| e.difficulty == 3));
    // A strong player is not capped below their request.
    let course = assemble_course(&mut rng, 1400, 10, &[OperationKind::Division], 9);
    assert!(course.iter().all(|e| e.difficulty == 9));
  }

  #[test]
  fn empty_course_kind_set_degrades_to_addition() {
    let mut rng = StdRng::seed_from_u64(13);
    let course = assemble_course(&mut rng, 700, 5, &[], 2);
    assert!(course.iter().all(|e| e.kind == OperationKind::Addition));
  }
}
