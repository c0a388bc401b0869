//! Binary Merkle tree over a block's ordered transaction hashes.
//!
//! Pairing rule: `parent = H(left || right)`. A level with an odd number of
//! nodes pairs its last node with itself. Both the hash function and the
//! duplicate-last rule must match the destination-chain verifier.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

use crate::error::ProofError;
use crate::hash::Hash32;

/// Hash function used for interior nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MerkleHash {
    #[default]
    Sha256,
    Keccak256,
}

impl MerkleHash {
    pub fn hash_pair(&self, left: &Hash32, right: &Hash32) -> Hash32 {
        match self {
            MerkleHash::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(left.0);
                hasher.update(right.0);
                Hash32(hasher.finalize().into())
            }
            MerkleHash::Keccak256 => {
                let mut hasher = Keccak::v256();
                let mut out = [0u8; 32];
                hasher.update(&left.0);
                hasher.update(&right.0);
                hasher.finalize(&mut out);
                Hash32(out)
            }
        }
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleHash::Sha256 => write!(f, "sha256"),
            MerkleHash::Keccak256 => write!(f, "keccak256"),
        }
    }
}

impl FromStr for MerkleHash {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(MerkleHash::Sha256),
            "keccak256" | "keccak" => Ok(MerkleHash::Keccak256),
            _ => Err(ProofError::InvalidInput(format!("Unknown merkle hash: {}", s))),
        }
    }
}

/// Which side of the running hash the sibling sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub hash: Hash32,
    pub side: Side,
}

/// Inclusion proof for one leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf_index: usize,
    /// Siblings ordered from leaf to root
    pub path: Vec<PathStep>,
    pub root: Hash32,
}

impl MerkleProof {
    /// Fold the path over `leaf`
    pub fn compute_root(&self, leaf: &Hash32, hasher: MerkleHash) -> Hash32 {
        compute_root(leaf, &self.path, hasher)
    }

    /// Check that the path reproduces both the stored root and `expected_root`
    pub fn verify(&self, leaf: &Hash32, expected_root: &Hash32, hasher: MerkleHash) -> bool {
        let root = self.compute_root(leaf, hasher);
        root == self.root && root == *expected_root
    }
}

/// Fold a sibling path over a leaf
pub fn compute_root(leaf: &Hash32, path: &[PathStep], hasher: MerkleHash) -> Hash32 {
    path.iter().fold(*leaf, |current, step| match step.side {
        Side::Left => hasher.hash_pair(&step.hash, &current),
        Side::Right => hasher.hash_pair(&current, &step.hash),
    })
}

/// Root of the tree over `leaves`, `None` when empty
pub fn merkle_root(leaves: &[Hash32], hasher: MerkleHash) -> Option<Hash32> {
    build_levels(leaves, hasher)
        .last()
        .and_then(|level| level.first().copied())
}

fn build_levels(leaves: &[Hash32], hasher: MerkleHash) -> Vec<Vec<Hash32>> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![leaves.to_vec()];
    while let Some(current) = levels.last().filter(|level| level.len() > 1) {
        let next: Vec<Hash32> = current
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hasher.hash_pair(left, right),
                [single] => hasher.hash_pair(single, single),
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
        levels.push(next);
    }
    levels
}

/// Builds inclusion proofs and checks them against the header root
#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleProofBuilder {
    hasher: MerkleHash,
}

impl MerkleProofBuilder {
    pub fn new(hasher: MerkleHash) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> MerkleHash {
        self.hasher
    }

    /// Prove that `target` is in `leaves` under `header_root`.
    ///
    /// Fails with `ProofConstruction` when the target is absent or the
    /// recomputed root differs from `header_root`.
    pub fn build(
        &self,
        target: &Hash32,
        leaves: &[Hash32],
        header_root: &Hash32,
    ) -> Result<MerkleProof, ProofError> {
        let leaf_index = leaves.iter().position(|h| h == target).ok_or_else(|| {
            ProofError::ProofConstruction(format!(
                "transaction {} not in block ({} leaves)",
                target,
                leaves.len()
            ))
        })?;

        let levels = build_levels(leaves, self.hasher);
        let mut path = Vec::with_capacity(levels.len().saturating_sub(1));
        let mut idx = leaf_index;

        for level in &levels[..levels.len() - 1] {
            let step = if idx % 2 == 1 {
                PathStep { hash: level[idx - 1], side: Side::Left }
            } else {
                // last node of an odd level is its own sibling
                let hash = level.get(idx + 1).copied().unwrap_or(level[idx]);
                PathStep { hash, side: Side::Right }
            };
            path.push(step);
            idx /= 2;
        }

        let root = compute_root(target, &path, self.hasher);
        if root != *header_root {
            return Err(ProofError::ProofConstruction(format!(
                "recomputed root {} does not match header root {}",
                root, header_root
            )));
        }

        Ok(MerkleProof { leaf_index, path, root })
    }
}
