// point-pair bookkeeping for drag editing
//
// each pair is a drag vector: a start (source) coordinate and a target
// coordinate, keyed by an ordinal assigned in creation order. at most one
// pair is ever incomplete (missing its target), and it is always the pair
// with the highest index.

use std::collections::BTreeMap;

/// (x, y) pixel coordinate in UI space. the optimizer works in (row, col);
/// the axis swap happens only at the export/commit boundary.
pub type Coord = [f32; 2];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointPair {
    /// position of the first click, fixed until the next reset
    pub start: Option<Coord>,
    /// moving source position, overwritten each drawn optimization step
    pub start_temp: Option<Coord>,
    pub target: Option<Coord>,
}

impl PointPair {
    /// the source coordinate the optimizer should move from: the transient
    /// position once optimization has run, the original click otherwise
    pub fn effective_start(&self) -> Option<Coord> {
        self.start_temp.or(self.start)
    }

    pub fn is_complete(&self) -> bool {
        self.effective_start().is_some() && self.target.is_some()
    }
}

/// ordered collection of point pairs, indices assigned from 0 in click order
#[derive(Clone, Debug, Default)]
pub struct PointRegistry {
    pairs: BTreeMap<usize, PointPair>,
}

impl PointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn get(&self, index: usize) -> Option<&PointPair> {
        self.pairs.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PointPair)> {
        self.pairs.iter().map(|(k, v)| (*k, v))
    }

    /// highest index whose target is still unset, if any. because clicks
    /// alternate start/target, only the last pair can ever be open.
    pub fn latest_open_pair(&self) -> Option<usize> {
        let (idx, pair) = self.pairs.iter().next_back()?;
        if pair.target.is_none() { Some(*idx) } else { None }
    }

    /// record one image click. first click of a pair sets the start, the
    /// second fills the target, the next click opens a fresh pair.
    /// returns the index of the affected pair.
    pub fn register_click(&mut self, coord: Coord) -> usize {
        if let Some(idx) = self.latest_open_pair() {
            if let Some(pair) = self.pairs.get_mut(&idx) {
                pair.target = Some(coord);
            }
            log::info!("click image - target - {coord:?}");
            return idx;
        }
        let idx = self
            .pairs
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(0);
        self.pairs.insert(
            idx,
            PointPair {
                start: Some(coord),
                start_temp: None,
                target: None,
            },
        );
        log::info!("click image - start - {coord:?}");
        idx
    }

    pub fn remove(&mut self, index: usize) {
        self.pairs.remove(&index);
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn has_complete_pair(&self) -> bool {
        self.pairs.values().any(PointPair::is_complete)
    }

    /// flatten complete pairs for the optimizer: sources and targets in
    /// insertion order with axes reversed to (row, col), plus the pair
    /// indices so step results can be committed back. pairs missing an
    /// effective start or a target are skipped.
    pub fn export_for_optimization(&self) -> (Vec<Coord>, Vec<Coord>, Vec<usize>) {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut indices = Vec::new();
        for (idx, pair) in &self.pairs {
            let (Some(start), Some(target)) = (pair.effective_start(), pair.target) else {
                continue;
            };
            sources.push([start[1], start[0]]);
            targets.push([target[1], target[0]]);
            indices.push(*idx);
        }
        (sources, targets, indices)
    }

    /// write step results back so markers follow the optimization.
    /// `sources`/`targets` are in the optimizer's (row, col) convention.
    pub fn commit_step(&mut self, indices: &[usize], sources: &[Coord], targets: &[Coord]) {
        for ((idx, src), tgt) in indices.iter().zip(sources).zip(targets) {
            if let Some(pair) = self.pairs.get_mut(idx) {
                pair.start_temp = Some([src[1], src[0]]);
                pair.target = Some([tgt[1], tgt[0]]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_sequence_builds_pairs() {
        let mut reg = PointRegistry::new();
        reg.register_click([10.0, 20.0]);
        assert_eq!(
            reg.get(0),
            Some(&PointPair {
                start: Some([10.0, 20.0]),
                start_temp: None,
                target: None,
            })
        );

        reg.register_click([30.0, 40.0]);
        assert_eq!(reg.get(0).unwrap().target, Some([30.0, 40.0]));

        reg.register_click([50.0, 60.0]);
        assert_eq!(reg.get(1).unwrap().start, Some([50.0, 60.0]));
        assert_eq!(reg.get(1).unwrap().target, None);
    }

    #[test]
    fn test_at_most_one_open_pair() {
        let mut reg = PointRegistry::new();
        for i in 0..7 {
            reg.register_click([i as f32, i as f32]);
            let open = reg
                .iter()
                .filter(|(_, p)| !p.is_complete())
                .count();
            assert!(open <= 1, "more than one incomplete pair after click {i}");
        }
    }

    #[test]
    fn test_indices_strictly_increasing() {
        let mut reg = PointRegistry::new();
        for i in 0..8 {
            reg.register_click([i as f32, 0.0]);
        }
        let indices: Vec<usize> = reg.iter().map(|(k, _)| k).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_latest_open_pair() {
        let mut reg = PointRegistry::new();
        assert_eq!(reg.latest_open_pair(), None);
        reg.register_click([1.0, 1.0]);
        assert_eq!(reg.latest_open_pair(), Some(0));
        reg.register_click([2.0, 2.0]);
        assert_eq!(reg.latest_open_pair(), None);
    }

    #[test]
    fn test_export_skips_open_pair_and_reverses_axes() {
        let mut reg = PointRegistry::new();
        reg.register_click([10.0, 20.0]);
        reg.register_click([30.0, 40.0]);
        reg.register_click([50.0, 60.0]); // open pair, must be excluded

        let (sources, targets, indices) = reg.export_for_optimization();
        assert_eq!(sources, vec![[20.0, 10.0]]);
        assert_eq!(targets, vec![[40.0, 30.0]]);
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_export_prefers_transient_source() {
        let mut reg = PointRegistry::new();
        reg.register_click([10.0, 20.0]);
        reg.register_click([30.0, 40.0]);
        reg.commit_step(&[0], &[[25.0, 15.0]], &[[40.0, 30.0]]);

        assert_eq!(reg.get(0).unwrap().start_temp, Some([15.0, 25.0]));
        let (sources, _, _) = reg.export_for_optimization();
        assert_eq!(sources, vec![[25.0, 15.0]]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut reg = PointRegistry::new();
        reg.register_click([1.0, 1.0]);
        reg.register_click([2.0, 2.0]);
        reg.remove(0);
        assert!(reg.is_empty());

        reg.register_click([3.0, 3.0]);
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.has_complete_pair());
    }
}
