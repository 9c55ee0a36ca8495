//! RFC 6962 Merkle tree arithmetic used to verify a Rekor inclusion proof.

use crate::crypto::hash::sha256;
use crate::error::TransparencyError;

/// Leaf hash per RFC 6962: `SHA256(0x00 || data)`.
pub fn compute_leaf_hash(data: &[u8]) -> [u8; 32] {
    let mut leaf_data = Vec::with_capacity(1 + data.len());
    leaf_data.push(0x00);
    leaf_data.extend_from_slice(data);
    sha256(&leaf_data)
}

fn hash_children(left: &[u8], right: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(1 + left.len() + right.len());
    data.push(0x01);
    data.extend_from_slice(left);
    data.extend_from_slice(right);
    sha256(&data)
}

/// Largest power of two strictly less than `n` (n must be > 1).
fn largest_pow2_less_than(n: u64) -> u64 {
    let mut p = 1u64;
    while p * 2 < n {
        p *= 2;
    }
    p
}

/// Recompute the Merkle root for `leaf_index` in a tree of `tree_size` leaves
/// given `leaf_hash` and the RFC 6962 audit path (ordered leaf-to-root, the
/// shape Rekor's `hashes[]` uses), then compare against `root_hash`.
///
/// This follows the RFC 6962 §2.1.1 `PATH`/`MTH` recursive split at the
/// largest power of two below the (sub)tree size, which is required for
/// correctness on tree sizes that are not themselves a power of two — a
/// naive "halve the index every level" walk only happens to be correct for
/// perfectly balanced trees.
pub fn verify_inclusion_proof(
    leaf_hash: &[u8],
    log_index: u64,
    tree_size: u64,
    proof_hashes: &[Vec<u8>],
    root_hash: &[u8],
) -> Result<(), TransparencyError> {
    if tree_size == 0 || log_index >= tree_size {
        return Err(TransparencyError::InvalidEntryHash);
    }

    let mut pos = 0usize;
    let computed = reconstruct_root(log_index, tree_size, leaf_hash, proof_hashes, &mut pos)?;

    if pos != proof_hashes.len() {
        return Err(TransparencyError::BadInclusionProof);
    }

    if computed == root_hash {
        Ok(())
    } else {
        Err(TransparencyError::BadInclusionProof)
    }
}

fn reconstruct_root(
    index: u64,
    size: u64,
    leaf_hash: &[u8],
    proof: &[Vec<u8>],
    pos: &mut usize,
) -> Result<[u8; 32], TransparencyError> {
    if size == 1 {
        return leaf_hash
            .try_into()
            .map_err(|_| TransparencyError::InvalidEntryHash);
    }

    let k = largest_pow2_less_than(size);
    if index < k {
        let left = reconstruct_root(index, k, leaf_hash, proof, pos)?;
        let right = next_sibling(proof, pos)?;
        Ok(hash_children(&left, right))
    } else {
        let right = reconstruct_root(index - k, size - k, leaf_hash, proof, pos)?;
        let left = next_sibling(proof, pos)?;
        Ok(hash_children(left, &right))
    }
}

fn next_sibling<'a>(
    proof: &'a [Vec<u8>],
    pos: &mut usize,
) -> Result<&'a [u8], TransparencyError> {
    let hash = proof.get(*pos).ok_or(TransparencyError::BadInclusionProof)?;
    *pos += 1;
    Ok(hash.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(data: &[u8]) -> [u8; 32] {
        compute_leaf_hash(data)
    }

    #[test]
    fn test_compute_leaf_hash() {
        let data = b"test data";
        let hash = compute_leaf_hash(data);
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn test_single_leaf_tree() {
        let l = leaf(b"only");
        let result = verify_inclusion_proof(&l, 0, 1, &[], &l);
        assert!(result.is_ok());
    }

    #[test]
    fn test_two_leaf_tree() {
        let l0 = leaf(b"a");
        let l1 = leaf(b"b");
        let root = hash_children(&l0, &l1);

        assert!(verify_inclusion_proof(&l0, 0, 2, &[l1.to_vec()], &root).is_ok());
        assert!(verify_inclusion_proof(&l1, 1, 2, &[l0.to_vec()], &root).is_ok());
    }

    #[test]
    fn test_three_leaf_tree_unbalanced() {
        // RFC 6962 splits a 3-leaf tree as {0,1} | {2}: k = largest pow2 < 3 = 2.
        let l0 = leaf(b"a");
        let l1 = leaf(b"b");
        let l2 = leaf(b"c");
        let left_subtree = hash_children(&l0, &l1);
        let root = hash_children(&left_subtree, &l2);

        // Leaf 0: audit path = [l1, l2]
        assert!(verify_inclusion_proof(&l0, 0, 3, &[l1.to_vec(), l2.to_vec()], &root).is_ok());
        // Leaf 1: audit path = [l0, l2]
        assert!(verify_inclusion_proof(&l1, 1, 3, &[l0.to_vec(), l2.to_vec()], &root).is_ok());
        // Leaf 2: audit path = [left_subtree]
        assert!(verify_inclusion_proof(&l2, 2, 3, &[left_subtree.to_vec()], &root).is_ok());
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let l0 = leaf(b"a");
        let l1 = leaf(b"b");
        let root = hash_children(&l0, &l1);
        let wrong_sibling = leaf(b"not-b").to_vec();

        let result = verify_inclusion_proof(&l0, 0, 2, &[wrong_sibling], &root);
        assert!(result.is_err());
    }

    #[test]
    fn test_index_out_of_bounds() {
        let l = leaf(b"x");
        let result = verify_inclusion_proof(&l, 5, 3, &[], &l);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_proof_rejected() {
        let l0 = leaf(b"a");
        let l1 = leaf(b"b");
        let root = hash_children(&l0, &l1);
        // Missing the required sibling.
        let result = verify_inclusion_proof(&l0, 0, 2, &[], &root);
        assert!(result.is_err());
    }
}
