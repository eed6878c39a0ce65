use crate::stage::StageInfo;
use std::fmt;

/// The stage list split at the first stateful stage.
///
/// Elements cross `pre_barrier` one at a time, in source order. When a
/// `barrier` exists it collects every survivor before anything reaches
/// `post_barrier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan<'p> {
    pub pre_barrier: &'p [StageInfo],
    pub barrier: Option<StageInfo>,
    pub post_barrier: &'p [StageInfo],
}

impl<'p> Plan<'p> {
    pub fn of(stages: &'p [StageInfo]) -> Self {
        match stages.iter().position(|s| s.kind.is_stateful()) {
            Some(at) => Self {
                pre_barrier: &stages[..at],
                barrier: Some(stages[at]),
                post_barrier: &stages[at + 1..],
            },
            None => Self {
                pre_barrier: stages,
                barrier: None,
                post_barrier: &[],
            },
        }
    }

    #[inline]
    pub fn is_element_at_a_time(&self) -> bool {
        self.barrier.is_none()
    }
}

impl fmt::Display for Plan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |stages: &[StageInfo]| {
            stages
                .iter()
                .map(|s| s.kind.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        };
        write!(f, "[{}]", join(self.pre_barrier))?;
        if let Some(barrier) = self.barrier {
            write!(f, " | {} | [{}]", barrier.kind, join(self.post_barrier))?;
        }
        Ok(())
    }
}
