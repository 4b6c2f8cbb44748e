use serde::{Deserialize, Serialize};
use strata_mesh::NUM_SUPPORTED_LODS;

/// One entry of the LOD table: use `lod` while the viewer is within
/// `visible_dst_threshold` of the chunk edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    pub lod: u32,
    pub visible_dst_threshold: f32,
}

impl LodInfo {
    pub fn new(lod: u32, visible_dst_threshold: f32) -> Self {
        Self { lod, visible_dst_threshold }
    }

    pub fn sqr_visible_dst_threshold(&self) -> f32 {
        self.visible_dst_threshold * self.visible_dst_threshold
    }
}

/// Index into `detail_levels` for a viewer `distance` away from the chunk edge.
/// Anything past the second-to-last threshold falls into the last entry.
pub fn select_lod_index(detail_levels: &[LodInfo], distance: f32) -> usize {
    let mut lod_index = 0;
    for (i, level) in detail_levels.iter().enumerate().take(detail_levels.len().saturating_sub(1)) {
        if distance > level.visible_dst_threshold {
            lod_index = i + 1;
        } else {
            break;
        }
    }
    lod_index
}

/// Panics on a malformed LOD table. These are configuration bugs, not runtime conditions.
pub fn validate_detail_levels(detail_levels: &[LodInfo], collider_lod_index: usize) {
    assert!(!detail_levels.is_empty(), "LOD table is empty");
    for level in detail_levels {
        assert!(
            (level.lod as usize) < NUM_SUPPORTED_LODS,
            "LOD {} out of range (max {})",
            level.lod,
            NUM_SUPPORTED_LODS - 1
        );
    }
    for pair in detail_levels.windows(2) {
        assert!(
            pair[0].visible_dst_threshold < pair[1].visible_dst_threshold,
            "LOD thresholds must ascend: {} then {}",
            pair[0].visible_dst_threshold,
            pair[1].visible_dst_threshold
        );
    }
    assert!(
        collider_lod_index < detail_levels.len(),
        "Collider LOD index {} outside LOD table of {}",
        collider_lod_index,
        detail_levels.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<LodInfo> {
        vec![LodInfo::new(0, 100.0), LodInfo::new(1, 200.0), LodInfo::new(4, 400.0)]
    }

    #[test]
    fn test_select_lod_index() {
        let levels = table();
        assert_eq!(select_lod_index(&levels, 0.0), 0);
        assert_eq!(select_lod_index(&levels, 100.0), 0);
        assert_eq!(select_lod_index(&levels, 100.5), 1);
        assert_eq!(select_lod_index(&levels, 250.0), 2);
        // Past the view distance the last entry still wins; visibility is decided elsewhere
        assert_eq!(select_lod_index(&levels, 9000.0), 2);
    }

    #[test]
    fn test_single_entry_table() {
        assert_eq!(select_lod_index(&[LodInfo::new(2, 50.0)], 70.0), 0);
    }

    #[test]
    fn test_valid_table_passes() {
        validate_detail_levels(&table(), 2);
    }

    #[test]
    #[should_panic(expected = "LOD table is empty")]
    fn test_empty_table_panics() {
        validate_detail_levels(&[], 0);
    }

    #[test]
    #[should_panic(expected = "must ascend")]
    fn test_non_monotonic_panics() {
        validate_detail_levels(&[LodInfo::new(0, 300.0), LodInfo::new(1, 200.0)], 0);
    }

    #[test]
    #[should_panic(expected = "Collider LOD index")]
    fn test_collider_index_out_of_range_panics() {
        validate_detail_levels(&table(), 3);
    }
}
