// src/slots.rs - Mapping detector output order onto stable hand slots
use nalgebra::distance;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keypoints::{HandObservation, Keypoint};
use crate::signal::{classify_handedness, Handedness};

/// Number of hands tracked at once.
pub const MAX_HANDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Slot = position in the detector's output list.
    DetectionOrder,
    /// Keep each slot on the hand whose wrist moved least since last frame.
    NearestNeighbor,
    /// Slot 0 for the left hand, slot 1 for the right.
    Handedness,
}

pub type SlotAssignment = [Option<HandObservation>; MAX_HANDS];

#[derive(Debug, Clone)]
pub struct SlotAssigner {
    policy: SlotPolicy,
    previous_wrists: [Option<Keypoint>; MAX_HANDS],
}

impl SlotAssigner {
    pub fn new(policy: SlotPolicy) -> Self {
        Self {
            policy,
            previous_wrists: [None; MAX_HANDS],
        }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    pub fn reset(&mut self) {
        self.previous_wrists = [None; MAX_HANDS];
    }

    /// Distributes up to [`MAX_HANDS`] observations over the slots. Extra
    /// hands are dropped.
    pub fn assign(&mut self, mut hands: Vec<HandObservation>) -> SlotAssignment {
        if hands.len() > MAX_HANDS {
            debug!("Dropping {} hands beyond the first {}", hands.len() - MAX_HANDS, MAX_HANDS);
            hands.truncate(MAX_HANDS);
        }

        let assignment = match self.policy {
            SlotPolicy::DetectionOrder => by_order(hands),
            SlotPolicy::NearestNeighbor => self.by_nearest(hands),
            SlotPolicy::Handedness => by_handedness(hands),
        };

        for (previous, hand) in self.previous_wrists.iter_mut().zip(assignment.iter()) {
            if let Some(hand) = hand {
                *previous = Some(hand.wrist());
            }
        }
        assignment
    }

    fn by_nearest(&self, hands: Vec<HandObservation>) -> SlotAssignment {
        let known = self.previous_wrists.iter().filter(|w| w.is_some()).count();
        if known == 0 {
            return by_order(hands);
        }

        let mut hands = hands.into_iter();
        match (hands.next(), hands.next()) {
            (None, _) => [None, None],
            (Some(only), None) => {
                let slot = self.closest_slot(only.wrist());
                let mut out: SlotAssignment = [None, None];
                out[slot] = Some(only);
                out
            }
            (Some(a), Some(b)) => {
                let straight = self.cost(0, &a) + self.cost(1, &b);
                let swapped = self.cost(0, &b) + self.cost(1, &a);
                if swapped < straight {
                    [Some(b), Some(a)]
                } else {
                    [Some(a), Some(b)]
                }
            }
        }
    }

    fn closest_slot(&self, wrist: Keypoint) -> usize {
        (0..MAX_HANDS)
            .filter_map(|slot| self.previous_wrists[slot].map(|w| (slot, distance(&w, &wrist))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(slot, _)| slot)
            .unwrap_or(0)
    }

    fn cost(&self, slot: usize, hand: &HandObservation) -> f64 {
        self.previous_wrists[slot]
            .map(|w| distance(&w, &hand.wrist()))
            .unwrap_or(0.0)
    }
}

fn by_order(hands: Vec<HandObservation>) -> SlotAssignment {
    let mut out: SlotAssignment = [None, None];
    for (slot, hand) in out.iter_mut().zip(hands) {
        *slot = Some(hand);
    }
    out
}

fn by_handedness(hands: Vec<HandObservation>) -> SlotAssignment {
    let mut out: SlotAssignment = [None, None];
    let mut leftovers = Vec::new();

    for hand in hands {
        let slot = match classify_handedness(&hand) {
            Handedness::Left => 0,
            Handedness::Right => 1,
        };
        if out[slot].is_none() {
            out[slot] = Some(hand);
        } else {
            leftovers.push(hand);
        }
    }

    // Two hands classified alike: the second one takes the free slot.
    for hand in leftovers {
        if let Some(free) = out.iter_mut().find(|s| s.is_none()) {
            *free = Some(hand);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::fixtures::open_hand;

    fn wrist_x(slot: &Option<HandObservation>) -> Option<f64> {
        slot.as_ref().map(|h| h.wrist().x)
    }

    #[test]
    fn detection_order_follows_the_list() {
        let mut assigner = SlotAssigner::new(SlotPolicy::DetectionOrder);
        let out = assigner.assign(vec![open_hand(10.0, 0.0, 5.0), open_hand(200.0, 0.0, 5.0)]);
        assert_eq!(wrist_x(&out[0]), Some(10.0));
        assert_eq!(wrist_x(&out[1]), Some(200.0));

        let out = assigner.assign(vec![open_hand(200.0, 0.0, 5.0), open_hand(10.0, 0.0, 5.0)]);
        assert_eq!(wrist_x(&out[0]), Some(200.0));
    }

    #[test]
    fn nearest_neighbor_survives_order_swaps() {
        let mut assigner = SlotAssigner::new(SlotPolicy::NearestNeighbor);
        assigner.assign(vec![open_hand(10.0, 0.0, 5.0), open_hand(200.0, 0.0, 5.0)]);

        let out = assigner.assign(vec![open_hand(205.0, 3.0, 5.0), open_hand(14.0, 1.0, 5.0)]);
        assert_eq!(wrist_x(&out[0]), Some(14.0));
        assert_eq!(wrist_x(&out[1]), Some(205.0));
    }

    #[test]
    fn single_hand_returns_to_its_slot() {
        let mut assigner = SlotAssigner::new(SlotPolicy::NearestNeighbor);
        assigner.assign(vec![open_hand(10.0, 0.0, 5.0), open_hand(200.0, 0.0, 5.0)]);

        let out = assigner.assign(vec![open_hand(198.0, 0.0, 5.0)]);
        assert!(out[0].is_none());
        assert_eq!(wrist_x(&out[1]), Some(198.0));
    }

    #[test]
    fn extra_hands_are_dropped() {
        let mut assigner = SlotAssigner::new(SlotPolicy::DetectionOrder);
        let out = assigner.assign(vec![
            open_hand(0.0, 0.0, 5.0),
            open_hand(50.0, 0.0, 5.0),
            open_hand(100.0, 0.0, 5.0),
        ]);
        assert!(out.iter().all(|s| s.is_some()));
        assert_eq!(wrist_x(&out[1]), Some(50.0));
    }

    #[test]
    fn handedness_puts_mirrored_hands_apart() {
        let hand = open_hand(50.0, 50.0, 5.0);
        let mirrored_points: Vec<(f64, f64)> = hand
            .keypoints()
            .iter()
            .map(|p| (300.0 - p.x, p.y))
            .collect();
        let mirrored = HandObservation::from_points(&mirrored_points).unwrap();
        assert_eq!(classify_handedness(&hand), Handedness::Left);
        assert_eq!(classify_handedness(&mirrored), Handedness::Right);

        let mut assigner = SlotAssigner::new(SlotPolicy::Handedness);
        let out = assigner.assign(vec![mirrored.clone(), hand.clone()]);
        assert_eq!(out[0].as_ref(), Some(&hand));
        assert_eq!(out[1].as_ref(), Some(&mirrored));
    }
}
