//! Participant → cluster/group resolution over a snapshot's index space.
//!
//! A snapshot relates three coordinate spaces: participant ids, base-cluster
//! indices (positions in the snapshot's index-aligned arrays), and the
//! externally visible base-cluster and group ids. Resolution walks
//! participant → index → id.
//!
//! A participant the clustering has not placed anywhere resolves to
//! "unassigned" (`None`) — that is an ordinary answer, not an error. An index
//! that should exist but does not (a dangling group reference, an id array
//! shorter than the membership table) is a data-integrity fault: it is logged
//! as a warning and also resolves to unassigned, never a panic.

use tracing::warn;

use crate::types::{BaseClusterId, ComputedSnapshot, GroupId, ParticipantId};

/// Read-only resolution over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ClusterIndexResolver<'a> {
    snapshot: &'a ComputedSnapshot,
}

impl<'a> ClusterIndexResolver<'a> {
    pub fn new(snapshot: &'a ComputedSnapshot) -> Self {
        ClusterIndexResolver { snapshot }
    }

    /// The base-cluster index whose member list contains `participant`.
    ///
    /// `None` means the participant is unassigned in this snapshot.
    pub fn base_cluster_index(&self, participant: ParticipantId) -> Option<usize> {
        self.snapshot
            .base_cluster_members
            .iter()
            .position(|members| members.contains(&participant))
    }

    /// The externally visible id of the participant's base cluster.
    pub fn base_cluster_id(&self, participant: ParticipantId) -> Option<BaseClusterId> {
        let index = self.base_cluster_index(participant)?;
        match self.snapshot.cluster_id_at(index) {
            Some(id) => Some(id),
            None => {
                warn!(
                    conversation = %self.snapshot.conversation,
                    math_tick = %self.snapshot.math_tick,
                    index,
                    "base-cluster index has no id; resolving as unassigned"
                );
                None
            }
        }
    }

    /// The id of the coarse group whose member clusters include the
    /// participant's base cluster.
    pub fn group_id(&self, participant: ParticipantId) -> Option<GroupId> {
        let index = self.base_cluster_index(participant)?;

        if index >= self.snapshot.base_cluster_count() {
            warn!(
                conversation = %self.snapshot.conversation,
                math_tick = %self.snapshot.math_tick,
                index,
                "membership index outside the snapshot's index range; resolving as unassigned"
            );
            return None;
        }

        self.snapshot
            .group_clusters
            .iter()
            .find(|group| group.member_base_cluster_indices.contains(&index))
            .map(|group| group.id)
    }
}
