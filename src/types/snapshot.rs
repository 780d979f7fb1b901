//! Computed opinion-clustering snapshots.
//!
//! Snapshots are produced by the external math worker and arrive as a raw
//! payload carrying two independently computed views of base-cluster
//! membership: a members-by-index table and an index→participant-list table.
//! Historically these could drift apart silently. Decoding unifies them into
//! one canonical membership table and rejects payloads where the two views
//! disagree, so every consumer reads from a single index space.
//!
//! # Index space
//!
//! `base_cluster_ids[i]` names the cluster whose members are
//! `base_cluster_members[i]`; group clusters reference base clusters by that
//! same index `i`. All index-aligned arrays must share one length.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{BaseClusterId, ConversationId, GroupId, MathTick, ParticipantId};

/// A coarse opinion group: a bloc of base clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCluster {
    /// Externally visible group identifier.
    pub id: GroupId,

    /// Indices into the snapshot's base-cluster index space.
    pub member_base_cluster_indices: Vec<usize>,
}

/// The wire form of a snapshot, as written by the math worker.
///
/// Carries both membership views; see [`ComputedSnapshot::from_raw`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSnapshot {
    pub conversation: ConversationId,
    pub math_tick: MathTick,
    pub base_cluster_ids: Vec<BaseClusterId>,
    pub base_cluster_members: Vec<Vec<ParticipantId>>,
    pub index_to_participants: Vec<Vec<ParticipantId>>,
    pub group_clusters: Vec<GroupCluster>,
}

/// Data-integrity faults detected while decoding a raw snapshot.
///
/// These are handled and logged by the fetch path; they never abort the
/// process. A rejected snapshot leaves the previously cached version in place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotDataError {
    /// The index-aligned arrays have different lengths.
    #[error(
        "index-aligned arrays disagree in length: {ids} cluster ids, \
         {members} member lists, {index_lists} index lists"
    )]
    LengthMismatch {
        ids: usize,
        members: usize,
        index_lists: usize,
    },

    /// The two membership views disagree at some index.
    #[error("membership views disagree at base-cluster index {index}")]
    MembershipMismatch { index: usize },
}

/// A validated clustering snapshot with one canonical membership table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedSnapshot {
    pub conversation: ConversationId,

    /// Monotonic version; strictly increasing per conversation, never reused.
    pub math_tick: MathTick,

    /// Externally visible id of each base cluster, by index.
    pub base_cluster_ids: Vec<BaseClusterId>,

    /// Canonical membership: participants of each base cluster, by index.
    pub base_cluster_members: Vec<Vec<ParticipantId>>,

    pub group_clusters: Vec<GroupCluster>,
}

impl ComputedSnapshot {
    /// Validates a raw worker payload and unifies its membership views.
    ///
    /// The two views must have the same length as `base_cluster_ids` and must
    /// contain the same participants at every index (order within a member
    /// list is not significant). Group-cluster indices are *not* range-checked
    /// here: a dangling group index is resolved as unassigned at lookup time
    /// with a logged warning.
    pub fn from_raw(raw: RawSnapshot) -> Result<Self, SnapshotDataError> {
        let ids = raw.base_cluster_ids.len();
        let members = raw.base_cluster_members.len();
        let index_lists = raw.index_to_participants.len();
        if ids != members || ids != index_lists {
            return Err(SnapshotDataError::LengthMismatch {
                ids,
                members,
                index_lists,
            });
        }

        for (index, (a, b)) in raw
            .base_cluster_members
            .iter()
            .zip(&raw.index_to_participants)
            .enumerate()
        {
            let mut a_sorted = a.clone();
            let mut b_sorted = b.clone();
            a_sorted.sort_unstable();
            b_sorted.sort_unstable();
            if a_sorted != b_sorted {
                return Err(SnapshotDataError::MembershipMismatch { index });
            }
        }

        Ok(ComputedSnapshot {
            conversation: raw.conversation,
            math_tick: raw.math_tick,
            base_cluster_ids: raw.base_cluster_ids,
            base_cluster_members: raw.base_cluster_members,
            group_clusters: raw.group_clusters,
        })
    }

    /// Number of base clusters (the shared index-space length).
    pub fn base_cluster_count(&self) -> usize {
        self.base_cluster_ids.len()
    }

    /// Derived view: the external id of the base cluster at `index`.
    pub fn cluster_id_at(&self, index: usize) -> Option<BaseClusterId> {
        self.base_cluster_ids.get(index).copied()
    }

    /// Derived view: the members of the base cluster at `index`.
    pub fn members_at(&self, index: usize) -> Option<&[ParticipantId]> {
        self.base_cluster_members.get(index).map(Vec::as_slice)
    }
}
