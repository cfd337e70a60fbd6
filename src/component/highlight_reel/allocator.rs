//! 片段排名與預算分配
//!
//! 流程：
//! 1. 依分數（其次信心度、起始時間）排序候選片段
//! 2. 決定場景數上限（手動指定或依平均片段長度推算）
//! 3. 依分數貪婪挑選，跳過重疊片段，直到達到上限或超出長度預算
//! 4. 預算連第一個片段都放不下時，截短該片段
//! 5. 依起始時間重新排序作為最終播放順序

use crate::component::highlight_reel::types::{CandidateSegment, SceneCountMode, SegmentClip};
use log::debug;
use std::cmp::Ordering;

/// 自動模式的場景數下限
pub const AUTO_MIN_SCENES: usize = 3;
/// 自動模式的場景數上限
pub const AUTO_MAX_SCENES: usize = 8;

const BUDGET_EPSILON: f64 = 1e-6;

/// 分配結果
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// 依起始時間排序的片段
    pub clips: Vec<SegmentClip>,
    pub scene_cap: usize,
}

impl Allocation {
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(SegmentClip::duration).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationOutcome {
    Selected(Allocation),
    /// 沒有可用的候選片段，不應進入組合階段
    Empty,
}

/// 候選片段的排序規則：分數高者優先，其次信心度高者，再其次起始時間早者
fn compare_candidates(a: &CandidateSegment, b: &CandidateSegment) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.start_time.total_cmp(&b.start_time))
}

/// 依排名規則排序候選片段
#[must_use]
pub fn rank_candidates(candidates: &[CandidateSegment]) -> Vec<&CandidateSegment> {
    let mut ranked: Vec<&CandidateSegment> = candidates.iter().collect();
    ranked.sort_by(|a, b| compare_candidates(a, b));
    ranked
}

/// 自動模式的場景數：`clamp(round(target / 平均片段長度), 3, 8)`
#[must_use]
pub fn auto_scene_count(target_duration: f64, candidates: &[CandidateSegment]) -> usize {
    if candidates.is_empty() {
        return AUTO_MIN_SCENES;
    }

    let mean = candidates.iter().map(CandidateSegment::duration).sum::<f64>()
        / candidates.len() as f64;

    if mean <= 0.0 || !mean.is_finite() {
        return AUTO_MIN_SCENES;
    }

    let estimate = (target_duration / mean).round();
    if estimate.is_finite() && estimate > 0.0 {
        (estimate as usize).clamp(AUTO_MIN_SCENES, AUTO_MAX_SCENES)
    } else {
        AUTO_MIN_SCENES
    }
}

fn scene_cap(mode: SceneCountMode, target_duration: f64, candidates: &[CandidateSegment]) -> usize {
    match mode {
        SceneCountMode::Manual(n) => n as usize,
        SceneCountMode::Auto => auto_scene_count(target_duration, candidates),
    }
}

/// 在長度與場景數預算內挑選不重疊的片段
#[must_use]
pub fn allocate(
    candidates: &[CandidateSegment],
    target_duration: f64,
    mode: SceneCountMode,
) -> AllocationOutcome {
    if candidates.is_empty() || target_duration <= 0.0 {
        return AllocationOutcome::Empty;
    }

    let cap = scene_cap(mode, target_duration, candidates);
    if cap == 0 {
        return AllocationOutcome::Empty;
    }

    let ranked = rank_candidates(candidates);
    let mut accepted: Vec<SegmentClip> = Vec::with_capacity(cap);
    let mut remaining = target_duration;

    for (rank, candidate) in ranked.into_iter().enumerate() {
        if accepted.len() >= cap {
            break;
        }

        if accepted
            .iter()
            .any(|clip| clip.overlaps(candidate.start_time, candidate.end_time))
        {
            debug!(
                "跳過重疊片段 #{rank}: {:.2}s-{:.2}s",
                candidate.start_time, candidate.end_time
            );
            continue;
        }

        let duration = candidate.duration();
        if duration > remaining + BUDGET_EPSILON {
            if accepted.is_empty() {
                debug!("第一個片段超出預算，截短為 {remaining:.2}s");
                accepted.push(SegmentClip::truncated_to(candidate, rank, remaining));
            }
            break;
        }

        accepted.push(SegmentClip::from_candidate(candidate, rank));
        remaining -= duration;
    }

    accepted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    debug!(
        "分配完成：{} 個片段，上限 {cap}，剩餘預算 {remaining:.2}s",
        accepted.len()
    );

    AllocationOutcome::Selected(Allocation {
        clips: accepted,
        scene_cap: cap,
    })
}
