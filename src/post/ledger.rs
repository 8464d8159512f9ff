//! Vote, like and comment mutations on a [`Post`].
//!
//! Per user, a post's vote is one of three states:
//!
//! | current | up   | down |
//! |---------|------|------|
//! | none    | up   | down |
//! | up      | none | down |
//! | down    | up   | none |
//!
//! Re-applying the current direction clears the vote. A user id is never in both
//! `upvoters` and `downvoters`, and `score` is recomputed after every vote change.
//! Likes are a separate set with no effect on the score.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::comment::model::Comment;
use crate::post::post_model::Post;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid vote type: {0}")]
    InvalidVoteType(String),

    #[error("Comment content cannot be empty")]
    EmptyComment,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Not authorized to delete this comment")]
    NotCommentAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl FromStr for VoteDirection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(LedgerError::InvalidVoteType(other.to_string())),
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Up => f.write_str("up"),
            VoteDirection::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    None,
    Up,
    Down,
}

impl Post {
    /// `|upvoters| - |downvoters|`, straight from the sets.
    pub fn tally(&self) -> i64 {
        self.upvoters.len() as i64 - self.downvoters.len() as i64
    }

    pub fn refresh_score(&mut self) {
        self.score = self.tally();
    }

    pub fn vote_state(&self, user_id: &ObjectId) -> VoteState {
        if self.upvoters.contains(user_id) {
            VoteState::Up
        } else if self.downvoters.contains(user_id) {
            VoteState::Down
        } else {
            VoteState::None
        }
    }

    fn voters_mut(&mut self, direction: VoteDirection) -> &mut BTreeSet<ObjectId> {
        match direction {
            VoteDirection::Up => &mut self.upvoters,
            VoteDirection::Down => &mut self.downvoters,
        }
    }

    /// Toggle `user_id`'s vote in `direction` and return the resulting state.
    pub fn apply_vote(&mut self, user_id: ObjectId, direction: VoteDirection) -> VoteState {
        let already_same_direction = self.voters_mut(direction).contains(&user_id);

        self.upvoters.remove(&user_id);
        self.downvoters.remove(&user_id);

        if !already_same_direction {
            self.voters_mut(direction).insert(user_id);
        }

        self.refresh_score();
        self.vote_state(&user_id)
    }

    /// Flip `user_id`'s like. Returns whether the post is liked afterwards.
    pub fn toggle_like(&mut self, user_id: ObjectId) -> bool {
        if self.likers.remove(&user_id) {
            false
        } else {
            self.likers.insert(user_id);
            true
        }
    }

    /// Prepend a new comment so the most recent one is first.
    pub fn add_comment(&mut self, author_id: ObjectId, content: &str) -> Result<&Comment, LedgerError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(LedgerError::EmptyComment);
        }

        self.comments.insert(0, Comment::new(author_id, content.to_string()));
        Ok(&self.comments[0])
    }

    /// Remove a comment. Only its author may do so, unless `privileged` (admin).
    pub fn remove_comment(
        &mut self,
        comment_id: &ObjectId,
        caller: &ObjectId,
        privileged: bool,
    ) -> Result<Comment, LedgerError> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == *comment_id)
            .ok_or(LedgerError::CommentNotFound)?;

        if self.comments[index].author_id != *caller && !privileged {
            return Err(LedgerError::NotCommentAuthor);
        }

        Ok(self.comments.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(
            ObjectId::new(),
            ObjectId::new(),
            "Hello".into(),
            "World".into(),
        )
    }

    fn assert_invariants(post: &Post) {
        assert!(post.upvoters.is_disjoint(&post.downvoters));
        assert_eq!(post.score, post.upvoters.len() as i64 - post.downvoters.len() as i64);
    }

    #[test]
    fn transition_table() {
        use VoteDirection::{Down, Up};

        let cases = [
            (None, Up, VoteState::Up),
            (None, Down, VoteState::Down),
            (Some(Up), Up, VoteState::None),
            (Some(Up), Down, VoteState::Down),
            (Some(Down), Up, VoteState::Up),
            (Some(Down), Down, VoteState::None),
        ];

        for (start, input, expected) in cases {
            let mut post = post();
            let user = ObjectId::new();
            if let Some(dir) = start {
                post.apply_vote(user, dir);
            }
            assert_eq!(post.apply_vote(user, input), expected, "{:?} + {}", start, input);
            assert_invariants(&post);
        }
    }

    #[test]
    fn voting_twice_clears_the_vote() {
        let mut post = post();
        let user = ObjectId::new();
        post.apply_vote(user, VoteDirection::Up);
        post.apply_vote(user, VoteDirection::Up);

        assert!(!post.upvoters.contains(&user));
        assert!(!post.downvoters.contains(&user));
        assert_eq!(post.score, 0);
    }

    #[test]
    fn switching_direction_moves_score_by_two() {
        let mut post = post();
        let user = ObjectId::new();

        post.apply_vote(user, VoteDirection::Up);
        assert_eq!(post.score, 1);
        post.apply_vote(user, VoteDirection::Down);

        assert!(post.downvoters.contains(&user));
        assert!(!post.upvoters.contains(&user));
        assert_eq!(post.score, -1);
    }

    #[test]
    fn two_user_scenario() {
        let mut post = post();
        let (a, b) = (ObjectId::new(), ObjectId::new());

        post.apply_vote(a, VoteDirection::Up);
        assert_eq!(post.score, 1);
        post.apply_vote(b, VoteDirection::Down);
        assert_eq!(post.score, 0);
        post.apply_vote(a, VoteDirection::Down);
        assert_eq!(post.score, -2);
        assert_invariants(&post);
    }

    #[test]
    fn long_vote_sequences_keep_invariants() {
        let mut post = post();
        let users: Vec<ObjectId> = (0..4).map(|_| ObjectId::new()).collect();

        for step in 0..64usize {
            let user = users[step % users.len()];
            let direction = if (step / 3) % 2 == 0 {
                VoteDirection::Up
            } else {
                VoteDirection::Down
            };
            post.apply_vote(user, direction);
            assert_invariants(&post);
        }
    }

    #[test]
    fn like_is_its_own_inverse_and_leaves_votes_alone() {
        let mut post = post();
        let user = ObjectId::new();
        post.apply_vote(user, VoteDirection::Down);
        let before = post.likers.clone();

        assert!(post.toggle_like(user));
        assert!(post.likers.contains(&user));
        assert!(post.downvoters.contains(&user));
        assert_eq!(post.score, -1);

        assert!(!post.toggle_like(user));
        assert_eq!(post.likers, before);
        assert_invariants(&post);
    }

    #[test]
    fn comments_are_prepended() {
        let mut post = post();
        let author = ObjectId::new();
        post.add_comment(author, "first").unwrap();
        let newest = post.add_comment(author, "  second  ").unwrap().id;

        assert_eq!(post.comments[0].id, newest);
        assert_eq!(post.comments[0].content, "second");
        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.score, 0);
    }

    #[test]
    fn blank_comment_is_rejected() {
        let mut post = post();
        assert_eq!(
            post.add_comment(ObjectId::new(), "   ").unwrap_err(),
            LedgerError::EmptyComment
        );
        assert!(post.comments.is_empty());
    }

    #[test]
    fn only_author_or_admin_removes_comment() {
        let mut post = post();
        let author = ObjectId::new();
        let stranger = ObjectId::new();
        let comment_id = post.add_comment(author, "mine").unwrap().id;

        assert_eq!(
            post.remove_comment(&comment_id, &stranger, false).unwrap_err(),
            LedgerError::NotCommentAuthor
        );
        assert_eq!(post.comments.len(), 1);

        assert_eq!(
            post.remove_comment(&ObjectId::new(), &author, false).unwrap_err(),
            LedgerError::CommentNotFound
        );

        post.remove_comment(&comment_id, &stranger, true).unwrap();
        assert!(post.comments.is_empty());
    }

    #[test]
    fn vote_direction_parsing() {
        assert_eq!("up".parse::<VoteDirection>().unwrap(), VoteDirection::Up);
        assert_eq!("down".parse::<VoteDirection>().unwrap(), VoteDirection::Down);
        assert_eq!(
            "UP".parse::<VoteDirection>().unwrap_err(),
            LedgerError::InvalidVoteType("UP".into())
        );
    }
}
