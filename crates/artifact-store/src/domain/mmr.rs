//! # Artifact Merkle Mountain Range
//!
//! An append-only accumulator over the leaves of one PoC stage's artifact
//! log. Leaves are never removed; the structure only ever grows until the
//! stage is retired and its whole log is pruned as a unit.
//!
//! Unlike a from-scratch Merkle tree, the accumulator never rehashes a
//! leaf it has already absorbed. `append` carries a stack of "peaks",
//! each a complete binary tree whose height is implied by the binary
//! representation of the leaf count, and merges the two most recent
//! peaks whenever they reach equal height — the same carry-chain shape
//! as incrementing a binary counter. A peak only ever grows by being
//! merged into a taller one, so both `append` and `prove` walk at most
//! O(log n) nodes regardless of how many leaves the stage already holds.
//! The root bags the peaks right-to-left: the rightmost (smallest, most
//! recently completed) peak seeds the accumulator and each peak to its
//! left folds in on top of it.

use node_crypto::hashing::{internal_hash, Hash};

#[derive(Debug, Clone)]
enum PeakNode {
    Leaf(Hash),
    Internal { hash: Hash, height: u32, left: Box<PeakNode>, right: Box<PeakNode> },
}

impl PeakNode {
    fn hash(&self) -> Hash {
        match self {
            PeakNode::Leaf(h) => *h,
            PeakNode::Internal { hash, .. } => *hash,
        }
    }

    fn height(&self) -> u32 {
        match self {
            PeakNode::Leaf(_) => 0,
            PeakNode::Internal { height, .. } => *height,
        }
    }

    fn merge(left: PeakNode, right: PeakNode) -> PeakNode {
        let height = left.height() + 1;
        let hash = internal_hash(&left.hash(), &right.hash());
        PeakNode::Internal { hash, height, left: Box::new(left), right: Box::new(right) }
    }

    /// Path from this peak's root down to the leaf at `local_index`
    /// (0-based within this peak), siblings tagged with whether they sit
    /// to the right of the accumulated hash.
    fn path_to(&self, local_index: u64) -> Vec<(Hash, bool)> {
        let mut node = self;
        let mut idx = local_index;
        let mut height = self.height();
        let mut path = Vec::with_capacity(height as usize);
        while height > 0 {
            let half = 1u64 << (height - 1);
            match node {
                PeakNode::Internal { left, right, .. } => {
                    if idx < half {
                        path.push((right.hash(), true));
                        node = left;
                    } else {
                        path.push((left.hash(), false));
                        node = right;
                        idx -= half;
                    }
                }
                PeakNode::Leaf(_) => break,
            }
            height -= 1;
        }
        path
    }

    fn leaf_at(&self, local_index: u64) -> Hash {
        let mut node = self;
        let mut idx = local_index;
        let mut height = self.height();
        while height > 0 {
            let half = 1u64 << (height - 1);
            match node {
                PeakNode::Internal { left, right, .. } => {
                    if idx < half {
                        node = left;
                    } else {
                        node = right;
                        idx -= half;
                    }
                }
                PeakNode::Leaf(_) => break,
            }
            height -= 1;
        }
        node.hash()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ArtifactMmr {
    /// Active peaks, largest (tallest) first, matching the descending
    /// power-of-two decomposition of the leaf count.
    peaks: Vec<PeakNode>,
    len: u64,
}

/// Inclusion proof for one leaf against the MMR root at the time of proving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactProof {
    pub leaf_index: u64,
    pub leaf: Hash,
    /// Sibling hashes from the leaf up to its peak's root, with a flag for
    /// whether the sibling sits to the right of the accumulated hash.
    pub path: Vec<(Hash, bool)>,
    /// Position of this leaf's peak within the full peak list.
    pub peak_index: usize,
    /// The other peaks' roots, tagged with their position in the peak list.
    pub other_peaks: Vec<(usize, Hash)>,
}

impl ArtifactMmr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_leaves(leaves: Vec<Hash>) -> Self {
        let mut mmr = Self::default();
        for leaf in leaves {
            mmr.append(leaf);
        }
        mmr
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absorb one new leaf. Amortized O(1): each merge in the carry chain
    /// retires one existing peak, and a leaf participates in at most
    /// O(log n) merges over the accumulator's whole lifetime.
    pub fn append(&mut self, leaf: Hash) -> u64 {
        let index = self.len;
        self.len += 1;
        let mut node = PeakNode::Leaf(leaf);
        while let Some(top) = self.peaks.last() {
            if top.height() == node.height() {
                let left = self.peaks.pop().expect("checked Some above");
                node = PeakNode::merge(left, node);
            } else {
                break;
            }
        }
        self.peaks.push(node);
        index
    }

    pub fn leaf(&self, index: u64) -> Option<Hash> {
        if index >= self.len {
            return None;
        }
        let (peak, local) = self.locate(index)?;
        Some(peak.leaf_at(local))
    }

    /// Find the peak covering `index` and the leaf's offset within it.
    fn locate(&self, index: u64) -> Option<(&PeakNode, u64)> {
        let mut offset = 0u64;
        for peak in &self.peaks {
            let size = 1u64 << peak.height();
            if index < offset + size {
                return Some((peak, index - offset));
            }
            offset += size;
        }
        None
    }

    /// Bag the peaks right-to-left: the smallest (rightmost, most
    /// recently completed) peak seeds the fold and each larger peak to
    /// its left combines on top of it.
    fn bag(peaks: &[Hash]) -> Hash {
        let mut iter = peaks.iter().rev();
        let mut acc = *iter.next().expect("at least one peak");
        for p in iter {
            acc = internal_hash(p, &acc);
        }
        acc
    }

    pub fn root(&self) -> Option<Hash> {
        if self.peaks.is_empty() {
            return None;
        }
        let roots: Vec<Hash> = self.peaks.iter().map(PeakNode::hash).collect();
        Some(Self::bag(&roots))
    }

    pub fn prove(&self, index: u64) -> Option<ArtifactProof> {
        if index >= self.len {
            return None;
        }
        let mut peak_index = 0;
        let mut path = Vec::new();
        let mut other_peaks = Vec::new();
        let mut offset = 0u64;
        for (pi, peak) in self.peaks.iter().enumerate() {
            let size = 1u64 << peak.height();
            if index >= offset && index < offset + size {
                peak_index = pi;
                path = peak.path_to(index - offset);
            } else {
                other_peaks.push((pi, peak.hash()));
            }
            offset += size;
        }
        Some(ArtifactProof {
            leaf_index: index,
            leaf: self.leaf(index)?,
            path,
            peak_index,
            other_peaks,
        })
    }
}

impl ArtifactProof {
    pub fn verify(&self, expected_root: &Hash) -> bool {
        let mut acc = self.leaf;
        for (sibling, sibling_is_right) in &self.path {
            acc = if *sibling_is_right {
                internal_hash(&acc, sibling)
            } else {
                internal_hash(sibling, &acc)
            };
        }
        let mut peaks = self.other_peaks.clone();
        peaks.push((self.peak_index, acc));
        peaks.sort_by_key(|(i, _)| *i);
        let ordered: Vec<Hash> = peaks.into_iter().map(|(_, h)| h).collect();
        ArtifactMmr::bag(&ordered) == *expected_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_crypto::hashing::leaf_hash;

    fn sample_mmr(n: i32) -> ArtifactMmr {
        let mut mmr = ArtifactMmr::new();
        for i in 0..n {
            mmr.append(leaf_hash(i, &i.to_le_bytes()));
        }
        mmr
    }

    #[test]
    fn root_is_none_when_empty() {
        assert!(ArtifactMmr::new().root().is_none());
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let mut mmr = ArtifactMmr::new();
        let h = leaf_hash(0, b"x");
        mmr.append(h);
        assert_eq!(mmr.root(), Some(h));
    }

    #[test]
    fn every_leaf_proves_against_the_root_for_various_sizes() {
        for n in [1, 2, 3, 4, 5, 7, 8, 13, 16, 31] {
            let mmr = sample_mmr(n);
            let root = mmr.root().unwrap();
            for i in 0..n as u64 {
                let proof = mmr.prove(i).expect("proof exists");
                assert!(proof.verify(&root), "leaf {i} failed to verify for n={n}");
            }
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let mmr = sample_mmr(6);
        let root = mmr.root().unwrap();
        let mut proof = mmr.prove(3).unwrap();
        proof.leaf[0] ^= 0xFF;
        assert!(!proof.verify(&root));
    }

    #[test]
    fn proof_against_wrong_root_fails() {
        let mmr = sample_mmr(6);
        let other_root = sample_mmr(7).root().unwrap();
        let proof = mmr.prove(0).unwrap();
        assert!(!proof.verify(&other_root));
    }

    #[test]
    fn prove_out_of_range_returns_none() {
        let mmr = sample_mmr(3);
        assert!(mmr.prove(3).is_none());
    }

    #[test]
    fn append_merges_peaks_instead_of_rebuilding_them() {
        // After 4 leaves the accumulator holds exactly one peak of height 2,
        // not four height-0 peaks: merges happened incrementally on append.
        let mmr = sample_mmr(4);
        assert_eq!(mmr.peaks.len(), 1);
        assert_eq!(mmr.peaks[0].height(), 2);
    }

    #[test]
    fn leaf_lookup_matches_append_order() {
        let mmr = sample_mmr(9);
        for i in 0..9u64 {
            assert_eq!(mmr.leaf(i), Some(leaf_hash(i as i32, &(i as i32).to_le_bytes())));
        }
        assert_eq!(mmr.leaf(9), None);
    }
}
