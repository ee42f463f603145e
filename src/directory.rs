//! User directory: who sponsors whom.
//!
//! A `Directory` is an immutable snapshot. Construction rejects duplicate ids
//! and sponsor cycles, so every upline walk terminates at a root, a broken
//! link or the requested depth.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{ReferralError, Result};
use crate::model::{User, UserId};

/// One step of an upline walk: `level` 1 is the immediate sponsor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UplineEntry<'a> {
    pub level: u32,
    pub sponsor: &'a User,
}

/// Display tree of a user's downline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownlineNode<'a> {
    pub user: &'a User,
    /// 1 for the root of the tree
    pub depth: usize,
    pub children: Vec<DownlineNode<'a>>,
}

impl DownlineNode<'_> {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<User>,
    index: HashMap<UserId, usize>,
    children: HashMap<UserId, Vec<usize>>,
}

impl Directory {
    pub fn new(users: Vec<User>) -> Result<Self> {
        let mut index = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            if index.insert(user.id.clone(), i).is_some() {
                return Err(ReferralError::DuplicateUser(user.id.clone()));
            }
        }

        ensure_acyclic(&users, &index)?;

        let mut children: HashMap<UserId, Vec<usize>> = HashMap::new();
        for (i, user) in users.iter().enumerate() {
            if let Some(sponsor) = &user.sponsor_id {
                children.entry(sponsor.clone()).or_default().push(i);
            }
        }

        info!(users = users.len(), "directory snapshot built");
        Ok(Self {
            users,
            index,
            children,
        })
    }

    pub fn find_user(&self, id: &UserId) -> Option<&User> {
        self.index.get(id).map(|&i| &self.users[i])
    }

    /// Direct recruits of `id`, in insertion order.
    pub fn children_of(&self, id: &UserId) -> Vec<&User> {
        self.children
            .get(id)
            .map(|idx| idx.iter().map(|&i| &self.users[i]).collect())
            .unwrap_or_default()
    }

    /// Sponsor chain of `user_id`, nearest first, at most `max_levels` long.
    ///
    /// Unknown users and roots yield an empty chain. A sponsor id that does
    /// not resolve ends the walk as if the last user found were a root.
    pub fn uplines_of(&self, user_id: &UserId, max_levels: usize) -> Vec<UplineEntry<'_>> {
        let mut uplines = Vec::new();
        let Some(mut current) = self.find_user(user_id) else {
            return uplines;
        };

        while uplines.len() < max_levels {
            let Some(sponsor_id) = current.sponsor_id.as_ref() else {
                break;
            };
            let Some(sponsor) = self.find_user(sponsor_id) else {
                warn!(
                    user = %current.id,
                    sponsor = %sponsor_id,
                    "sponsor link does not resolve; treating as root"
                );
                break;
            };
            uplines.push(UplineEntry {
                level: uplines.len() as u32 + 1,
                sponsor,
            });
            current = sponsor;
        }

        uplines
    }

    /// Downline tree rooted at `root`, `max_depth` levels deep (root counts
    /// as depth 1) with at most `max_children` children per node.
    pub fn downline(
        &self,
        root: &UserId,
        max_depth: usize,
        max_children: usize,
    ) -> Option<DownlineNode<'_>> {
        if max_depth == 0 {
            return None;
        }
        let root = self.find_user(root)?;

        // Flatten depth-first with an explicit stack, then assemble bottom-up.
        // Children always get a larger slot index than their parent.
        struct Slot<'a> {
            user: &'a User,
            depth: usize,
            children: Vec<usize>,
        }
        let mut slots: Vec<Slot<'_>> = Vec::new();
        let mut stack: Vec<(&User, usize, Option<usize>)> = vec![(root, 1, None)];

        while let Some((user, depth, parent)) = stack.pop() {
            let slot = slots.len();
            slots.push(Slot {
                user,
                depth,
                children: Vec::new(),
            });
            if let Some(p) = parent {
                slots[p].children.push(slot);
            }
            if depth < max_depth {
                let kids = self.children_of(&user.id);
                for child in kids.into_iter().take(max_children).rev() {
                    stack.push((child, depth + 1, Some(slot)));
                }
            }
        }

        let mut built: Vec<Option<DownlineNode<'_>>> = Vec::with_capacity(slots.len());
        built.resize_with(slots.len(), || None);
        for (i, slot) in slots.iter().enumerate().rev() {
            let children = slot
                .children
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[i] = Some(DownlineNode {
                user: slot.user,
                depth: slot.depth,
                children,
            });
        }
        built.into_iter().next().flatten()
    }

    /// All users in insertion order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn roots(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| u.is_root())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn ensure_acyclic(users: &[User], index: &HashMap<UserId, usize>) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        New,
        Walking,
        Done,
    }

    let mut marks = vec![Mark::New; users.len()];
    let mut path = Vec::new();
    for start in 0..users.len() {
        let mut cur = Some(start);
        while let Some(i) = cur {
            match marks[i] {
                Mark::Done => break,
                Mark::Walking => return Err(ReferralError::SponsorCycle(users[i].id.clone())),
                Mark::New => {
                    marks[i] = Mark::Walking;
                    path.push(i);
                    cur = users[i]
                        .sponsor_id
                        .as_ref()
                        .and_then(|s| index.get(s).copied());
                }
            }
        }
        for i in path.drain(..) {
            marks[i] = Mark::Done;
        }
    }
    Ok(())
}
