use serde_json::Value;

use crate::model::{Need, Span};

use super::availability::merge_overlapping;
use super::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedSatisfaction<'a> {
    pub need: &'a Need,
    pub satisfied: bool,
}

/// The evaluated task's needs over one inter-event sub-range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeNeedSatisfaction<'a> {
    pub span: Span,
    pub needs: Vec<NeedSatisfaction<'a>>,
}

impl RangeNeedSatisfaction<'_> {
    pub fn is_eligible(&self) -> bool {
        self.needs.iter().all(|n| n.satisfied)
    }
}

/// Result of sweeping a simulation with the evaluated task's needs.
#[derive(Debug)]
pub struct NeedSweep<'a> {
    needs: &'a [Need],
    ranges: Vec<RangeNeedSatisfaction<'a>>,
    /// Per need: documents it would claim, used by updates referencing it.
    referenced: Vec<Vec<Value>>,
}

impl<'a> NeedSweep<'a> {
    /// Drive `simulation` to its end, checking `needs` after every step.
    pub fn run(simulation: &mut Simulation<'_, '_>, needs: &'a [Need]) -> Self {
        let mut ranges = Vec::new();
        let mut referenced: Vec<Vec<Value>> = vec![Vec::new(); needs.len()];
        let mut settled = vec![false; needs.len()];

        while let Some((span, store)) = simulation.step() {
            let mut satisfactions = Vec::with_capacity(needs.len());
            for (i, need) in needs.iter().enumerate() {
                let quantity = need.quantity as usize;
                let found: Vec<&Value> = store
                    .find(&need.collection_name, &need.find)
                    .take(quantity)
                    .map(|doc| &doc.body)
                    .collect();
                // first range with the full quantity wins, else the earliest best one
                if !settled[i] && found.len() > referenced[i].len() {
                    referenced[i] = found.iter().map(|&body| body.clone()).collect();
                }
                if found.len() >= quantity {
                    settled[i] = true;
                }
                satisfactions.push(NeedSatisfaction {
                    need,
                    satisfied: !need.wait || found.len() >= quantity,
                });
            }
            ranges.push(RangeNeedSatisfaction {
                span,
                needs: satisfactions,
            });
        }

        Self {
            needs,
            ranges,
            referenced,
        }
    }

    pub fn ranges(&self) -> &[RangeNeedSatisfaction<'a>] {
        &self.ranges
    }

    /// Sub-ranges where every need holds, merged into maximal intervals.
    pub fn eligible(&self) -> Vec<Span> {
        let spans: Vec<Span> = self
            .ranges
            .iter()
            .filter(|r| r.is_eligible())
            .map(|r| r.span)
            .collect();
        merge_overlapping(&spans)
    }

    /// Every unsatisfied need, sub-range by sub-range.
    pub fn unmet(&self) -> impl Iterator<Item = (Span, &'a Need)> {
        self.ranges.iter().flat_map(|r| {
            r.needs
                .iter()
                .filter(|n| !n.satisfied)
                .map(move |n| (r.span, n.need))
        })
    }

    /// The need carrying `reference` and the documents it would claim.
    pub fn referenced(&self, reference: &str) -> Option<(&'a Need, &[Value])> {
        let i = self
            .needs
            .iter()
            .position(|n| n.reference.as_deref() == Some(reference))?;
        Some((&self.needs[i], &self.referenced[i]))
    }
}
