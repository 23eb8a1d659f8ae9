//! Merkle tree over a block's transactions.

use crate::hash::{hash_concat, sha256, Hash};
use crate::transaction::Transaction;

/// Compute the merkle root of a list of transactions.
pub fn merkle_root(transactions: &[Transaction]) -> Hash {
    MerkleTree::new(transactions).root()
}

/// A binary hash tree whose leaves are transaction content hashes.
///
/// Every level with an odd number of nodes (other than the root) has its last
/// node duplicated, so each stored level above the root has even length.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// All nodes in the tree, level by level (leaves first), padding included.
    levels: Vec<Vec<Hash>>,
    /// Number of leaves before padding.
    leaf_count: usize,
}

/// A merkle proof for a single leaf.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash,
    /// Sibling hashes from leaf to root.
    pub siblings: Vec<Hash>,
    /// Direction for each sibling (true = right, false = left).
    pub directions: Vec<bool>,
}

impl MerkleTree {
    /// Build a merkle tree from an ordered list of transactions.
    pub fn new(transactions: &[Transaction]) -> Self {
        let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.content_hash()).collect();
        Self::from_leaves(leaves)
    }

    /// Build a merkle tree from leaf hashes.
    pub fn from_leaves(mut leaves: Vec<Hash>) -> Self {
        let leaf_count = leaves.len();
        if leaves.is_empty() {
            return Self {
                levels: vec![vec![sha256(b"")]],
                leaf_count,
            };
        }

        pad_to_even(&mut leaves);
        let mut levels = vec![leaves];

        loop {
            let current = &levels[levels.len() - 1];
            if current.len() == 1 {
                break;
            }

            let mut next: Vec<Hash> = current
                .chunks(2)
                .map(|pair| hash_concat(&[pair[0].as_ref(), pair[1].as_ref()]))
                .collect();
            if next.len() > 1 {
                pad_to_even(&mut next);
            }
            levels.push(next);
        }

        Self { levels, leaf_count }
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Get the number of leaves in the tree (padding excluded).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count {
            return None;
        }

        let leaf = self.levels[0][index];
        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 0;
            let sibling_idx = if is_right { idx + 1 } else { idx - 1 };

            siblings.push(level[sibling_idx]);
            directions.push(is_right);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            siblings,
            directions,
        })
    }

    /// Verify a merkle proof against this tree's root.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.root(), proof)
    }
}

fn pad_to_even(level: &mut Vec<Hash>) {
    if level.len() % 2 == 1 {
        let last = level[level.len() - 1];
        level.push(last);
    }
}

/// Verify a merkle proof against a given root.
pub fn verify_proof(root: &Hash, proof: &MerkleProof) -> bool {
    let mut current = proof.leaf;

    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        current = if *is_right {
            hash_concat(&[current.as_ref(), sibling.as_ref()])
        } else {
            hash_concat(&[sibling.as_ref(), current.as_ref()])
        };
    }

    current == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Address;

    fn make_transactions(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| {
                Transaction::with_timestamp(
                    Some(Address::from_bytes([i as u8; 32])),
                    Address::from_bytes([i as u8 + 1; 32]),
                    i as u64 * 10,
                    1_600_000_000_000 + i as u64,
                )
            })
            .collect()
    }

    fn leaf(tx: &Transaction) -> Hash {
        tx.content_hash()
    }

    fn pair(a: Hash, b: Hash) -> Hash {
        hash_concat(&[a.as_ref(), b.as_ref()])
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(merkle_root(&[]), sha256(b""));
        assert_eq!(MerkleTree::new(&[]).leaf_count(), 0);
    }

    #[test]
    fn test_merkle_root_single_is_duplicated() {
        let txs = make_transactions(1);
        assert_eq!(merkle_root(&txs), pair(leaf(&txs[0]), leaf(&txs[0])));
    }

    #[test]
    fn test_merkle_root_two() {
        let txs = make_transactions(2);
        assert_eq!(merkle_root(&txs), pair(leaf(&txs[0]), leaf(&txs[1])));
    }

    #[test]
    fn test_merkle_root_three_duplicates_last_leaf() {
        let txs = make_transactions(3);
        let left = pair(leaf(&txs[0]), leaf(&txs[1]));
        let right = pair(leaf(&txs[2]), leaf(&txs[2]));
        assert_eq!(merkle_root(&txs), pair(left, right));
    }

    #[test]
    fn test_merkle_root_six_duplicates_inner_node() {
        // Leaves pair into three nodes; the third is duplicated one level up.
        let txs = make_transactions(6);
        let a = pair(leaf(&txs[0]), leaf(&txs[1]));
        let b = pair(leaf(&txs[2]), leaf(&txs[3]));
        let c = pair(leaf(&txs[4]), leaf(&txs[5]));
        let expected = pair(pair(a, b), pair(c, c));
        assert_eq!(merkle_root(&txs), expected);
    }

    #[test]
    fn test_merkle_root_deterministic() {
        let txs = make_transactions(10);
        assert_eq!(merkle_root(&txs), merkle_root(&txs.clone()));
    }

    #[test]
    fn test_merkle_root_order_matters() {
        let txs = make_transactions(4);
        let mut reversed = txs.clone();
        reversed.reverse();
        assert_ne!(merkle_root(&txs), merkle_root(&reversed));
    }

    #[test]
    fn test_merkle_root_detects_field_changes() {
        let txs = make_transactions(5);
        let root = merkle_root(&txs);

        for i in 0..txs.len() {
            let mut tampered = txs.clone();
            tampered[i].amount += 1;
            assert_ne!(root, merkle_root(&tampered), "amount change at {i}");

            let mut tampered = txs.clone();
            tampered[i].timestamp += 1;
            assert_ne!(root, merkle_root(&tampered), "timestamp change at {i}");
        }
    }

    #[test]
    fn test_merkle_root_detects_insertion_and_deletion() {
        let txs = make_transactions(4);
        let root = merkle_root(&txs);
        assert_ne!(root, merkle_root(&txs[..3]));
        assert_ne!(root, merkle_root(&make_transactions(5)));
    }

    #[test]
    fn test_merkle_proof_valid() {
        let txs = make_transactions(8);
        let tree = MerkleTree::new(&txs);

        for i in 0..txs.len() {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.leaf, leaf(&txs[i]));
            assert!(tree.verify_proof(&proof));
            assert!(verify_proof(&tree.root(), &proof));
        }
    }

    #[test]
    fn test_merkle_proof_odd_leaves() {
        for n in [1, 3, 5, 6, 7] {
            let txs = make_transactions(n);
            let tree = MerkleTree::new(&txs);
            assert_eq!(tree.leaf_count(), n);
            for i in 0..n {
                let proof = tree.proof(i).unwrap();
                assert!(tree.verify_proof(&proof), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_merkle_proof_invalid_index() {
        let tree = MerkleTree::new(&make_transactions(3));
        // Index 3 exists only as padding.
        assert!(tree.proof(3).is_none());
        assert!(tree.proof(10).is_none());
    }

    #[test]
    fn test_merkle_proof_wrong_root() {
        let tree = MerkleTree::new(&make_transactions(4));
        let proof = tree.proof(0).unwrap();
        assert!(!verify_proof(&sha256(b"wrong"), &proof));
    }
}
