//! In-process CloudWatch Logs implementation.
//!
//! Holds log groups and paged stream listings in memory, records every call
//! it receives, and can be told to fail specific calls. Deletions mutate the
//! state, so a second sweep over the same instance sees the result of the
//! first.

use super::{LogsApi, Page};
use crate::models::{LogGroupRef, LogStreamRef};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_PAGE_SIZE: usize = 50;
const TOKEN_PREFIX: &str = "page-";

/// A call received by [`InMemoryLogs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `DescribeLogGroups` for the given page index.
    DescribeLogGroups {
        /// Zero-based page index.
        page: usize,
    },
    /// `DescribeLogStreams` for one group and page index.
    DescribeLogStreams {
        /// Log group name.
        group: String,
        /// Zero-based page index.
        page: usize,
    },
    /// `DeleteLogStream`.
    DeleteLogStream {
        /// Log group name.
        group: String,
        /// Log stream name.
        stream: String,
    },
    /// `DeleteLogGroup`.
    DeleteLogGroup {
        /// Log group name.
        group: String,
    },
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<LogGroupRef>,
    stream_pages: HashMap<String, Vec<Vec<LogStreamRef>>>,
    calls: Vec<ApiCall>,
    group_pages_served: usize,
    failing_group_page: Option<usize>,
    failing_stream_listings: HashSet<String>,
    failing_deletes: HashSet<String>,
    transient_delete_failures: usize,
}

/// Scriptable in-memory [`LogsApi`].
#[derive(Debug)]
pub struct InMemoryLogs {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemoryLogs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogs {
    /// Creates an empty instance with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets how many groups (and streams, for [`Self::with_group`]) each page holds.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Adds a group whose streams are split into pages of the configured size.
    #[must_use]
    pub fn with_group(self, group: LogGroupRef, streams: Vec<LogStreamRef>) -> Self {
        let pages = if streams.is_empty() {
            vec![Vec::new()]
        } else {
            streams.chunks(self.page_size).map(<[_]>::to_vec).collect()
        };
        self.with_group_pages(group, pages)
    }

    /// Adds a group with an explicit stream page layout.
    ///
    /// Allows empty pages anywhere in the listing, including last.
    #[must_use]
    pub fn with_group_pages(self, group: LogGroupRef, pages: Vec<Vec<LogStreamRef>>) -> Self {
        {
            let mut state = self.lock();
            state.stream_pages.insert(group.name.clone(), pages);
            state.groups.push(group);
        }
        self
    }

    /// Makes the group listing fail when the given page index is requested.
    #[must_use]
    pub fn failing_group_listing_at(self, page: usize) -> Self {
        self.lock().failing_group_page = Some(page);
        self
    }

    /// Makes every stream listing of the named group fail.
    #[must_use]
    pub fn failing_stream_listing(self, group_name: &str) -> Self {
        self.lock()
            .failing_stream_listings
            .insert(group_name.to_string());
        self
    }

    /// Makes every delete call on the resource fail.
    ///
    /// Streams are addressed as `group:stream`, groups by name.
    #[must_use]
    pub fn failing_delete_of(self, resource: &str) -> Self {
        self.lock().failing_deletes.insert(resource.to_string());
        self
    }

    /// Makes the next `count` delete calls fail, whatever they target.
    #[must_use]
    pub fn failing_next_deletes(self, count: usize) -> Self {
        self.lock().transient_delete_failures = count;
        self
    }

    /// Returns every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Number of group listing pages served successfully.
    #[must_use]
    pub fn group_pages_served(&self) -> usize {
        self.lock().group_pages_served
    }

    /// Returns `true` if the group still exists.
    #[must_use]
    pub fn has_group(&self, group_name: &str) -> bool {
        self.lock().groups.iter().any(|g| g.name == group_name)
    }

    /// Names of the streams the group still holds, in listing order.
    #[must_use]
    pub fn stream_names(&self, group_name: &str) -> Vec<String> {
        self.lock()
            .stream_pages
            .get(group_name)
            .into_iter()
            .flatten()
            .flatten()
            .map(|s| s.stream_name.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    /// Consumes one injected delete failure for `resource`, if any applies.
    fn delete_fails(&mut self, resource: &str) -> bool {
        if self.failing_deletes.contains(resource) {
            return true;
        }
        if self.transient_delete_failures > 0 {
            self.transient_delete_failures -= 1;
            return true;
        }
        false
    }
}

fn parse_token(token: Option<&str>) -> Result<usize> {
    let Some(token) = token else {
        return Ok(0);
    };
    token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|index| index.parse().ok())
        .ok_or_else(|| Error::InvalidInput(format!("unknown pagination token: {token}")))
}

fn token_after(page: usize, page_count: usize) -> Option<String> {
    (page + 1 < page_count).then(|| format!("{TOKEN_PREFIX}{}", page + 1))
}

fn injected(operation: &'static str, resource: &str) -> Error {
    Error::Api {
        operation,
        resource: resource.to_string(),
        cause: "injected failure".to_string(),
    }
}

fn not_found(operation: &'static str, resource: &str) -> Error {
    Error::Api {
        operation,
        resource: resource.to_string(),
        cause: "ResourceNotFoundException: The specified resource does not exist.".to_string(),
    }
}

#[async_trait]
impl LogsApi for InMemoryLogs {
    async fn describe_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupRef>> {
        tokio::task::yield_now().await;
        let page = parse_token(next_token.as_deref())?;
        let mut state = self.lock();
        state.calls.push(ApiCall::DescribeLogGroups { page });

        if state.failing_group_page == Some(page) {
            return Err(injected("DescribeLogGroups", "*"));
        }

        let page_count = state.groups.len().div_ceil(self.page_size).max(1);
        let items = state
            .groups
            .iter()
            .skip(page * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();
        state.group_pages_served += 1;

        Ok(Page::new(items, token_after(page, page_count)))
    }

    async fn describe_log_streams(
        &self,
        group_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamRef>> {
        tokio::task::yield_now().await;
        let page = parse_token(next_token.as_deref())?;
        let mut state = self.lock();
        state.calls.push(ApiCall::DescribeLogStreams {
            group: group_name.to_string(),
            page,
        });

        if state.failing_stream_listings.contains(group_name) {
            return Err(injected("DescribeLogStreams", group_name));
        }

        let Some(pages) = state.stream_pages.get(group_name) else {
            return Err(not_found("DescribeLogStreams", group_name));
        };
        let items = pages.get(page).cloned().unwrap_or_default();

        Ok(Page::new(items, token_after(page, pages.len())))
    }

    async fn delete_log_stream(&self, group_name: &str, stream_name: &str) -> Result<()> {
        tokio::task::yield_now().await;
        let resource = format!("{group_name}:{stream_name}");
        let mut state = self.lock();
        state.calls.push(ApiCall::DeleteLogStream {
            group: group_name.to_string(),
            stream: stream_name.to_string(),
        });

        if state.delete_fails(&resource) {
            return Err(injected("DeleteLogStream", &resource));
        }

        let pages = state
            .stream_pages
            .get_mut(group_name)
            .ok_or_else(|| not_found("DeleteLogStream", &resource))?;
        let mut removed = false;
        for page in pages.iter_mut() {
            let before = page.len();
            page.retain(|s| s.stream_name != stream_name);
            removed |= page.len() != before;
        }
        if removed {
            Ok(())
        } else {
            Err(not_found("DeleteLogStream", &resource))
        }
    }

    async fn delete_log_group(&self, group_name: &str) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.calls.push(ApiCall::DeleteLogGroup {
            group: group_name.to_string(),
        });

        if state.delete_fails(group_name) {
            return Err(injected("DeleteLogGroup", group_name));
        }

        let before = state.groups.len();
        state.groups.retain(|g| g.name != group_name);
        if state.groups.len() == before {
            return Err(not_found("DeleteLogGroup", group_name));
        }
        state.stream_pages.remove(group_name);
        Ok(())
    }
}
