//! SQL-backed query resolution.
//!
//! [`SqlHandler`] is one stage in a handler chain: it answers queries it can
//! satisfy from the record store and defers everything else to the next
//! handler. Resolution is exact-match first, then a wildcard search under the
//! nearest ancestor zone, with a synthetic SOA attached to the additional
//! section when the store reports the name as unknown.
//!
//! The handler plugs into a hickory server loop through its
//! [`RequestHandler`] impl, and into tower stacks through
//! [`tower::Service`].

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use hickory_proto::op::{Header, Message, ResponseCode};
use hickory_proto::rr::{DNSClass, LowerName, Name, Record, RecordType};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

use crate::error::{HandlerError, StoreError};
use crate::rr::name::{bare_name, parent_candidate};
use crate::rr::{RecordFilter, RecordRow, ZoneId, ZoneRow, encode, wildcard_match};

/// Outcome of an exact-match record lookup.
///
/// `NotFound` means the store knows nothing about the queried name at all;
/// `Rows` means the name's namespace exists, possibly with zero live rows
/// matching the filter. The two drive different fallbacks: `NotFound` probes
/// for a negative-answer SOA, while an empty `Rows` runs the wildcard search,
/// so the distinction is a tagged variant rather than an overloaded empty
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    NotFound,
    Rows(Vec<RecordRow>),
}

/// Trait for the record store backing resolution.
///
/// Implementations are expected to be safe for concurrent reads; the handler
/// holds no locks and performs no caching of its own. See
/// [`SqliteStore`][crate::database::SqliteStore] for the bundled adapter.
#[async_trait::async_trait]
pub trait RecordStore {
    /// Exact-match lookup. Disabled rows are never returned.
    async fn find_records(&self, filter: &RecordFilter) -> Result<RecordLookup, StoreError>;

    /// Find the zone with exactly this apex name, if any (limit one).
    async fn find_zone(&self, name: &str) -> Result<Option<ZoneRow>, StoreError>;

    /// Candidate wildcard rows for a zone: rows whose stored name contains a
    /// `*` and whose type matches the query type (or anything, for ANY).
    async fn find_wildcard_candidates(
        &self,
        zone: ZoneId,
        qtype: RecordType,
    ) -> Result<Vec<RecordRow>, StoreError>;
}

/// Trait for a stage in the handler chain.
///
/// Handlers take a request and either produce a complete response message or
/// fail; passing a query further down the chain is each handler's own
/// business (see [`SqlHandler::with_next`]).
#[async_trait::async_trait]
pub trait DnsHandler: Send + Sync {
    async fn handle(&self, request: &Request) -> Result<Message, HandlerError>;
}

/// A handler answering queries from a SQL record store.
pub struct SqlHandler<S> {
    store: S,
    next: Option<Arc<dyn DnsHandler>>,
}

impl<S> fmt::Debug for SqlHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlHandler").finish()
    }
}

impl<S> Clone for SqlHandler<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            next: self.next.clone(),
        }
    }
}

impl<S> SqlHandler<S> {
    /// Create a terminal handler: queries it cannot answer fail with
    /// SERVFAIL instead of being passed on.
    pub fn new(store: S) -> Self {
        Self { store, next: None }
    }

    /// Create a handler that defers unanswered queries to `next`.
    pub fn with_next(store: S, next: Arc<dyn DnsHandler>) -> Self {
        Self {
            store,
            next: Some(next),
        }
    }
}

impl<S> SqlHandler<S>
where
    S: RecordStore + Send + Sync,
{
    /// Resolve a query against the store.
    ///
    /// Produces either a complete, authoritative response message or the
    /// next handler's response when nothing matched. Storage failures abort
    /// resolution; rows that fail to encode are dropped from the answer
    /// without failing the query.
    #[tracing::instrument(skip_all, fields(id = %request.id()), level = "debug")]
    pub async fn resolve(&self, request: &Request) -> Result<Message, HandlerError> {
        let request_info = request.request_info()?;
        let query = request_info.query;
        let qname = query.name();
        let qtype = query.query_type();
        let class = query.query_class();

        tracing::debug!(name = %qname, %qtype, "resolving");

        let owner = Name::from(qname.clone());
        let filter = RecordFilter::new(qname, qtype);

        let mut answers: Vec<Record> = Vec::new();
        let mut additionals: Vec<Record> = Vec::new();

        match self.store.find_records(&filter).await? {
            RecordLookup::NotFound => {
                // Negative answer: attach the zone's SOA when the name has
                // exactly one, so resolvers can cache the miss.
                if let Some(record) = self.soa_fallback(&filter, owner, class).await {
                    additionals.push(record);
                }
            }
            RecordLookup::Rows(rows) => {
                let rows = if rows.is_empty() {
                    self.search_wildcard(qname, qtype).await?
                } else {
                    rows
                };
                for row in &rows {
                    match encode(row, owner.clone(), class) {
                        Some(record) => answers.push(record),
                        None => tracing::debug!(name = %row.name, rtype = %row.rtype, "skipped row"),
                    }
                }
            }
        }

        if answers.is_empty() && additionals.is_empty() {
            tracing::debug!(name = %qname, "no records, deferring to next handler");
            return self.delegate(request).await;
        }

        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_response_code(ResponseCode::NoError);

        let mut response = Message::new();
        response.set_header(header);
        response.add_queries(request.queries().iter().map(|q| q.original().clone()));
        response.add_answers(answers);
        response.add_additionals(additionals);
        Ok(response)
    }

    /// Look up a single SOA at the queried name for a negative answer.
    ///
    /// Store errors here are swallowed: a failed probe just means no SOA is
    /// attached. Content that fails to parse is likewise a silent skip.
    async fn soa_fallback(
        &self,
        filter: &RecordFilter,
        owner: Name,
        class: DNSClass,
    ) -> Option<Record> {
        let filter = filter.with_record_type(RecordType::SOA);
        match self.store.find_records(&filter).await {
            Ok(RecordLookup::Rows(rows)) => match rows.as_slice() {
                [row] => encode(row, owner, class),
                _ => None,
            },
            Ok(RecordLookup::NotFound) => None,
            Err(error) => {
                tracing::debug!(name = %filter.name, "soa fallback lookup failed: {error}");
                None
            }
        }
    }

    /// Find wildcard records registered under the nearest ancestor zone.
    ///
    /// Walks the qname's ancestors (never descending to a bare top-level
    /// label) until a zone matches, then filters that zone's wildcard rows
    /// label-wise against the queried name. Runs out of ancestors: empty
    /// result, no error.
    async fn search_wildcard(
        &self,
        qname: &LowerName,
        qtype: RecordType,
    ) -> Result<Vec<RecordRow>, StoreError> {
        let qname = qname.to_string();
        let bare = bare_name(&qname);

        let mut name = bare;
        let zone = loop {
            match parent_candidate(name) {
                Some(parent) => name = parent,
                None => return Ok(Vec::new()),
            }
            tracing::trace!(zone = %name, "searching for ancestor zone");
            if let Some(zone) = self.store.find_zone(name).await? {
                break zone;
            }
        };

        tracing::debug!(zone = %zone.name, id = %zone.id, "matched ancestor zone");
        let rows = self.store.find_wildcard_candidates(zone.id, qtype).await?;
        Ok(rows
            .into_iter()
            .filter(|row| wildcard_match(bare, &row.name))
            .collect())
    }

    async fn delegate(&self, request: &Request) -> Result<Message, HandlerError> {
        match &self.next {
            Some(next) => next.handle(request).await,
            None => Err(HandlerError::NoNextHandler),
        }
    }
}

#[async_trait::async_trait]
impl<S> DnsHandler for SqlHandler<S>
where
    S: RecordStore + Send + Sync,
{
    async fn handle(&self, request: &Request) -> Result<Message, HandlerError> {
        self.resolve(request).await
    }
}

#[async_trait::async_trait]
impl<S> RequestHandler for SqlHandler<S>
where
    S: RecordStore + Send + Sync + Unpin + 'static,
{
    async fn handle_request<R>(&self, request: &Request, mut response_handle: R) -> ResponseInfo
    where
        R: ResponseHandler,
    {
        let message = match self.resolve(request).await {
            Ok(message) => message,
            Err(error) => {
                tracing::error!("error resolving query: {error}");
                let builder = MessageResponseBuilder::from_message_request(request);
                let response = builder.error_msg(request.header(), ResponseCode::ServFail);
                return self.respond(&mut response_handle, response).await;
            }
        };

        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(
            *message.header(),
            message.answers().iter(),
            message.name_servers().iter(),
            std::iter::empty(),
            message.additionals().iter(),
        );
        self.respond(&mut response_handle, response).await
    }
}

impl<S> SqlHandler<S> {
    async fn respond<'q, 'a, R: ResponseHandler>(
        &self,
        response_handle: &mut R,
        message: hickory_server::authority::MessageResponse<
            'q,
            'a,
            impl Iterator<Item = &'a Record> + Send,
            impl Iterator<Item = &'a Record> + Send,
            impl Iterator<Item = &'a Record> + Send,
            impl Iterator<Item = &'a Record> + Send,
        >,
    ) -> ResponseInfo {
        match response_handle.send_response(message).await {
            Ok(info) => info,
            Err(error) => {
                tracing::error!("send error: {error}");
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}

impl<S> tower::Service<Request> for SqlHandler<S>
where
    S: RecordStore + Clone + Send + Sync + 'static,
{
    type Response = Message;

    type Error = HandlerError;

    type Future = self::future::ResolveFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let handler = self.clone();
        self::future::ResolveFuture::new(async move { handler.resolve(&request).await })
    }
}

mod future {
    use std::{
        fmt,
        pin::Pin,
        task::{Context, Poll},
    };

    use hickory_proto::op::Message;

    use crate::error::HandlerError;

    pub struct ResolveFuture {
        inner: Pin<Box<dyn Future<Output = Result<Message, HandlerError>> + Send + 'static>>,
    }

    impl fmt::Debug for ResolveFuture {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ResolveFuture").finish()
        }
    }

    impl ResolveFuture {
        pub(super) fn new<F>(future: F) -> Self
        where
            F: Future<Output = Result<Message, HandlerError>> + Send + 'static,
        {
            Self {
                inner: Box::pin(future),
            }
        }
    }

    impl Future for ResolveFuture {
        type Output = Result<Message, HandlerError>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            self.inner.as_mut().poll(cx)
        }
    }
}
