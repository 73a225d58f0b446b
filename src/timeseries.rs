use num_traits::{CheckedAdd, Zero};


/// Running totals of a pair of flows, restarting at zero whenever the group
/// key changes between consecutive elements. The input must already be
/// ordered by group and then chronologically within each group.
///
/// Returns `None` if either running total overflows `V`.
pub fn grouped_cumsum<K: PartialEq, V: Copy + Zero + CheckedAdd>(
	items: impl IntoIterator<Item = (K, V, V)>,
) -> Option<Vec<(V, V)>> {
	let mut result = Vec::new();
	let mut prev: Option<K> = None;
	let mut accum = (V::zero(), V::zero());
	for (k, a, b) in items {
		if prev.as_ref() != Some(&k) {
			accum = (V::zero(), V::zero());
		}
		accum = (accum.0.checked_add(&a)?, accum.1.checked_add(&b)?);
		result.push(accum);
		prev = Some(k);
	}
	Some(result)
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn restarts_per_group() {
		let v = grouped_cumsum(vec![("a", 1u64, 0u64), ("a", 2, 1), ("b", 5, 5), ("b", 0, 0), ("a", 1, 1)]).unwrap();
		assert_eq!(v, vec![(1, 0), (3, 1), (5, 5), (5, 5), (1, 1)]);
	}

	#[test]
	fn cumulative_k_is_prefix_sum() {
		let flows = [3u64, 0, 7, 1, 9];
		let v = grouped_cumsum(flows.iter().map(|f| ("DE", *f, 2 * *f))).unwrap();
		for k in 0..flows.len() {
			let expected: u64 = flows[..=k].iter().sum();
			assert_eq!(v[k], (expected, 2 * expected));
		}
	}

	#[test]
	fn empty_input() {
		let v = grouped_cumsum(Vec::<(u8, u32, u32)>::new()).unwrap();
		assert!(v.is_empty());
	}

	#[test]
	fn overflow_is_reported() {
		assert_eq!(grouped_cumsum(vec![("a", u64::MAX, 0u64), ("a", 1, 0)]), None);
		// the restart at a new group keeps both halves in range
		let v = grouped_cumsum(vec![("a", u64::MAX, 0u64), ("b", 1, 0)]).unwrap();
		assert_eq!(v, vec![(u64::MAX, 0), (1, 0)]);
	}
}
