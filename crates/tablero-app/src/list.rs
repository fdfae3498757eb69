// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Controller for the saved-card listing screen: fetches the collection
//! scoped to the current organization and filter mode, and applies
//! success-gated local mutations (delete, unfavorite, inline save).

use crate::ids::CardId;
use crate::model::{Card, FilterMode, Organization};
use crate::remote::{ListReply, ListRequest, UpdateReply};

#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand {
    /// The ambient organization context changed. Empty emissions are
    /// ignored; every non-empty emission re-issues the list fetch.
    OrganizationChanged(Option<Organization>),
    Filter(FilterMode),
    SetSearch(Option<String>),
    Delete(CardId),
    /// Position in the currently displayed sequence. The card's identity
    /// is captured immediately; removal on completion is by identity, so
    /// list mutations during the round trip cannot remove the wrong card.
    Unfavorite(usize),
    /// Position in the currently displayed sequence, resolved to its
    /// backing-list slot at dispatch time.
    InlineSave(Box<Card>, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEffect {
    Request(ListRequest),
    /// The displayed sequence changed; re-render the list.
    Refresh,
    /// An inline save was rejected by the service. The sequence was left
    /// untouched; the caller must surface the message.
    SaveRejected(String),
}

#[derive(Debug)]
pub struct CardListScreen {
    cards: Vec<Card>,
    filter_mode: FilterMode,
    search_filter: Option<String>,
    org: Option<Organization>,
    next_request_id: u64,
    fetch_in_flight: Option<u64>,
    pending_deletes: Vec<(u64, CardId)>,
    pending_unfavorites: Vec<(u64, CardId)>,
    pending_saves: Vec<(u64, usize)>,
}

impl CardListScreen {
    /// `hash` is the one-time location-hash hint: `"fav"` starts on the
    /// favorites filter, anything else on the full listing.
    pub fn new(hash: Option<&str>) -> Self {
        Self {
            cards: Vec::new(),
            filter_mode: FilterMode::from_hash(hash),
            search_filter: None,
            org: None,
            next_request_id: 0,
            fetch_in_flight: None,
            pending_deletes: Vec::new(),
            pending_unfavorites: Vec::new(),
            pending_saves: Vec::new(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub const fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn search_filter(&self) -> Option<&str> {
        self.search_filter.as_deref()
    }

    /// The displayed sequence: the server response narrowed by the local
    /// search filter, if one is active.
    pub fn visible_cards(&self) -> Vec<&Card> {
        self.visible_positions()
            .into_iter()
            .map(|position| &self.cards[position])
            .collect()
    }

    /// Backing-list positions of the displayed sequence, in display order.
    fn visible_positions(&self) -> Vec<usize> {
        match &self.search_filter {
            None => (0..self.cards.len()).collect(),
            Some(needle) => {
                let needle = needle.to_lowercase();
                self.cards
                    .iter()
                    .enumerate()
                    .filter(|(_, card)| {
                        card.name
                            .as_deref()
                            .is_some_and(|name| name.to_lowercase().contains(&needle))
                    })
                    .map(|(position, _)| position)
                    .collect()
            }
        }
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEffect> {
        match command {
            ListCommand::OrganizationChanged(None) => Vec::new(),
            ListCommand::OrganizationChanged(Some(org)) => {
                self.org = Some(org);
                self.issue_fetch()
            }
            ListCommand::Filter(mode) => {
                self.filter_mode = mode;
                if self.org.is_some() {
                    self.issue_fetch()
                } else {
                    Vec::new()
                }
            }
            ListCommand::SetSearch(filter) => {
                self.search_filter = filter.filter(|text| !text.is_empty());
                vec![ListEffect::Refresh]
            }
            ListCommand::Delete(card_id) => {
                let request_id = self.next_request_id();
                self.pending_deletes.push((request_id, card_id));
                vec![ListEffect::Request(ListRequest::DeleteCard {
                    request_id,
                    card: card_id,
                })]
            }
            ListCommand::Unfavorite(index) => {
                let Some(card_id) = self.visible_cards().get(index).and_then(|card| card.id)
                else {
                    log::warn!("unfavorite index {index} does not resolve to a saved card");
                    return Vec::new();
                };
                let request_id = self.next_request_id();
                self.pending_unfavorites.push((request_id, card_id));
                vec![ListEffect::Request(ListRequest::UnfavoriteCard {
                    request_id,
                    card: card_id,
                })]
            }
            ListCommand::InlineSave(card, index) => {
                // The index names a slot in the displayed sequence; pin it
                // to the backing list before the round trip starts.
                let Some(position) = self.visible_positions().get(index).copied() else {
                    log::warn!("inline save index {index} does not resolve to a saved card");
                    return Vec::new();
                };
                let request_id = self.next_request_id();
                self.pending_saves.push((request_id, position));
                vec![ListEffect::Request(ListRequest::SaveCard {
                    request_id,
                    card: *card,
                })]
            }
        }
    }

    pub fn handle_reply(&mut self, reply: ListReply) -> Vec<ListEffect> {
        match reply {
            ListReply::CardsFetched {
                request_id,
                outcome,
            } => {
                if self.fetch_in_flight != Some(request_id) {
                    return Vec::new();
                }
                self.fetch_in_flight = None;
                match outcome {
                    Ok(cards) => {
                        self.cards = cards;
                        vec![ListEffect::Refresh]
                    }
                    Err(error) => {
                        log::warn!("error getting cards list: {error}");
                        Vec::new()
                    }
                }
            }
            ListReply::CardDeleted {
                request_id,
                outcome,
            } => {
                let Some(card_id) = take_pending(&mut self.pending_deletes, request_id) else {
                    return Vec::new();
                };
                match outcome {
                    Ok(()) => {
                        self.cards.retain(|card| card.id != Some(card_id));
                        self.search_filter = None;
                        vec![ListEffect::Refresh]
                    }
                    // No rollback and no user feedback, matching the
                    // original behavior (see DESIGN.md).
                    Err(error) => {
                        log::warn!("error deleting card {}: {error}", card_id.get());
                        Vec::new()
                    }
                }
            }
            ListReply::CardUnfavorited {
                request_id,
                outcome,
            } => {
                let Some(card_id) = take_pending(&mut self.pending_unfavorites, request_id) else {
                    return Vec::new();
                };
                match outcome {
                    Ok(()) => {
                        self.cards.retain(|card| card.id != Some(card_id));
                        vec![ListEffect::Refresh]
                    }
                    Err(error) => {
                        log::warn!("error unfavoriting card {}: {error}", card_id.get());
                        Vec::new()
                    }
                }
            }
            ListReply::CardSaved {
                request_id,
                outcome,
            } => {
                let Some(index) = take_pending(&mut self.pending_saves, request_id) else {
                    return Vec::new();
                };
                match outcome {
                    Ok(UpdateReply::Saved(card)) => {
                        if let Some(slot) = self.cards.get_mut(index) {
                            *slot = card;
                            vec![ListEffect::Refresh]
                        } else {
                            log::warn!("inline save target index {index} no longer exists");
                            Vec::new()
                        }
                    }
                    Ok(UpdateReply::Rejected(message)) => {
                        vec![ListEffect::SaveRejected(message)]
                    }
                    Err(error) => {
                        log::warn!("error saving card: {error}");
                        Vec::new()
                    }
                }
            }
        }
    }

    fn issue_fetch(&mut self) -> Vec<ListEffect> {
        let Some(org_id) = self.org.as_ref().map(|org| org.id) else {
            return Vec::new();
        };
        let request_id = self.next_request_id();
        // A newer fetch supersedes any older one still in flight.
        self.fetch_in_flight = Some(request_id);
        vec![ListEffect::Request(ListRequest::FetchCards {
            request_id,
            org: org_id,
            filter: self.filter_mode,
        })]
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}

fn take_pending<T: Copy>(pending: &mut Vec<(u64, T)>, request_id: u64) -> Option<T> {
    let position = pending.iter().position(|(id, _)| *id == request_id)?;
    Some(pending.swap_remove(position).1)
}
