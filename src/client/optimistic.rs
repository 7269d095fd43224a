use crate::domain::room::dto::{RoomDetailResponse, RoomVoteItem};
use crate::domain::vote::Estimate;

/// A user action whose effect is applied to the cache before the server confirms it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CastVote { value: Option<Estimate> },
    ResetVotes,
    ToggleVotesVisible,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CastVote { .. } => "cast vote",
            Mutation::ResetVotes => "reset votes",
            Mutation::ToggleVotesVisible => "toggle vote visibility",
        }
    }

    /// Local effect of the mutation performed by `actor`
    pub fn apply(&self, room: &mut RoomDetailResponse, actor: &str) {
        match self {
            Mutation::CastVote { value: None } => {
                room.votes.retain(|vote| vote.user_id != actor);
            }
            Mutation::CastVote { value: Some(estimate) } => {
                match room.votes.iter_mut().find(|vote| vote.user_id == actor) {
                    Some(vote) => vote.value = estimate.as_str().to_string(),
                    None => room.votes.push(RoomVoteItem {
                        user_id: actor.to_string(),
                        value: estimate.as_str().to_string(),
                    }),
                }
            }
            Mutation::ResetVotes => {
                room.votes.clear();
                room.votes_visible = false;
            }
            Mutation::ToggleVotesVisible => {
                room.votes_visible = !room.votes_visible;
            }
        }
    }
}
