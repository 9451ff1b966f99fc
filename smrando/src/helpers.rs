use rand::seq::SliceRandom;
use rand::Rng;

/// Uniform choice from a slice using the caller's seeded source. All random selection in the
/// generator goes through here or through `SliceRandom::shuffle` on the same source.
pub fn pick_random<'a, T, R: Rng>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}

/// Uniform choice among the elements accepted by `pred`.
pub fn pick_random_matching<'a, T, R: Rng>(
    items: &'a [T],
    pred: impl Fn(&T) -> bool,
    rng: &mut R,
) -> Option<&'a T> {
    let matching: Vec<&T> = items.iter().filter(|x| pred(x)).collect();
    matching.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_pick_random_is_seeded() {
        let items: Vec<usize> = (0..100).collect();
        let a: Vec<usize> = {
            let mut rng = rand::rngs::StdRng::seed_from_u64(7);
            (0..10).map(|_| *pick_random(&items, &mut rng).unwrap()).collect()
        };
        let b: Vec<usize> = {
            let mut rng = rand::rngs::StdRng::seed_from_u64(7);
            (0..10).map(|_| *pick_random(&items, &mut rng).unwrap()).collect()
        };
        assert_eq!(a, b);
        let empty: Vec<usize> = vec![];
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        assert!(pick_random(&empty, &mut rng).is_none());
    }

    #[test]
    fn test_pick_random_matching() {
        let items: Vec<usize> = (0..20).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let x = *pick_random_matching(&items, |x| x % 5 == 0, &mut rng).unwrap();
            assert_eq!(x % 5, 0);
        }
        assert!(pick_random_matching(&items, |&x| x > 100, &mut rng).is_none());
    }
}
