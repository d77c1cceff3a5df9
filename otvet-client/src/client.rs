//! The otvet.mail.ru API client.
//!
//! The service has no documented API. Everything here speaks the wire
//! protocol of the site itself: form posts to the `/api/` gateway signed
//! with a token/salt pair, a search proxy queried with GET, and a main
//! page that embeds the session markers and the category catalog in
//! inline scripts.
//!
//! # Calling convention
//!
//! ```text
//! POST https://otvet.mail.ru/api/
//! Referer: https://otvet.mail.ru/
//!
//! __urlp=/v2/questlist&token=<token>&salt=<salt>&state=A&n=20&p=0
//! ```
//!
//! Replies are JSON with a body-level `status` field; HTTP status codes
//! are not meaningful here.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use otvet_core::{
    Answer, AnswerPreview, BestQuestionPreview, Categories, Category, Limits, PollVoter, Question,
    QuestionPreview, QuestionSearchResult, QuestionState, SmallUser, UserProfile,
    UserQuestionPreview,
};

use crate::call::{self, CallRunner, Params, RawOutcome, Target};
use crate::cookies::{SSO_COOKIE, TOKEN_COOKIE, cookie_value, install_sso_cookie};
use crate::error::OtvetError;
use crate::live::{BatchFetch, LiveFeed, LiveOptions};
use crate::paging::{PageFetch, PageRequest, Pages};
use crate::retry::{RetryPolicy, is_transient};
use crate::session::{self, AuthSnapshot, AuthTokens, SessionState};
use crate::wire::{
    self, WireAnswer, WireAnswerPreview, WireBestQuestionPreview, WireLimits, WireNewAnswer,
    WireNewQuestion, WireProfile, WireQuestion, WireQuestionPreview, WireSearchResult,
    WireSmallUser, WireUserQuestionPreview,
};

// ============================================================================
// Constants
// ============================================================================

/// Public origin of the service.
pub const DEFAULT_BASE_URL: &str = "https://otvet.mail.ru";

/// Portal SSO endpoint that issues the session cookie.
pub const DEFAULT_AUTH_URL: &str = "https://auth.mail.ru/cgi-bin/auth";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Query that makes the main page embed the login block.
const MAIN_PAGE_QUERY: &str = "login=1";

// ============================================================================
// Request options
// ============================================================================

/// Filter for the main question listings.
#[derive(Debug, Clone)]
pub struct QuestionFilter {
    /// Question state to list. `None` lists every state.
    pub state: Option<QuestionState>,
    /// Category, by urlname or display name. `None` lists all categories.
    pub category: Option<String>,
    /// Category urlname the listing should exclude.
    pub category_exclude: Option<String>,
    /// Restrict the listing to leader questions.
    pub leaders_only: bool,
}

impl Default for QuestionFilter {
    /// Open questions across all categories.
    fn default() -> Self {
        Self {
            state: Some(QuestionState::Open),
            category: None,
            category_exclude: None,
            leaders_only: false,
        }
    }
}

/// Refinements for the full-text search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Order results by date instead of relevance.
    pub sort_by_date: bool,
    /// Only questions in this state.
    pub state: Option<QuestionState>,
    /// Only questions in this category, by urlname or display name.
    pub category: Option<String>,
    /// Only questions younger than this many days.
    pub last_days: Option<f64>,
    /// Match question text only, not answer text.
    pub questions_only: bool,
}

/// Knobs for asking a question or creating a poll.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Body text under the title.
    pub text: String,
    /// Allow comments on answers.
    pub allow_comments: bool,
    /// Watch the question for new answers.
    pub watch: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            allow_comments: true,
            watch: true,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures and creates an [`OtvetClient`].
#[derive(Debug, Clone)]
pub struct OtvetClientBuilder {
    base_url: String,
    auth_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    auto_renew: bool,
    snapshot: Option<AuthSnapshot>,
}

impl Default for OtvetClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_url: DEFAULT_AUTH_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            auto_renew: true,
            snapshot: None,
        }
    }
}

impl OtvetClientBuilder {
    /// Overrides the service origin.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the SSO endpoint.
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Turns automatic token renewal on or off.
    pub fn auto_renew(mut self, enabled: bool) -> Self {
        self.auto_renew = enabled;
        self
    }

    /// Restores a previously exported session.
    pub fn snapshot(mut self, snapshot: AuthSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when a URL does not parse,
    /// [`OtvetError::Parse`] when the snapshot carries only one half of the
    /// token/salt pair, and [`OtvetError::Http`] when the HTTP client cannot
    /// be constructed.
    pub fn build(self) -> Result<OtvetClient, OtvetError> {
        let base_url = parse_url(&self.base_url)?;
        let auth_url = parse_url(&self.auth_url)?;
        let api_url = join_url(&base_url, "api/")?;
        let search_url = join_url(&base_url, "go-proxy/answer_json")?;

        let jar = Arc::new(Jar::default());
        let state = match &self.snapshot {
            Some(snapshot) => {
                if let Some(cookie) = &snapshot.cookie {
                    install_sso_cookie(&jar, &base_url, cookie);
                }
                SessionState::from_snapshot(snapshot)?
            }
            None => SessionState::default(),
        };

        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(base_url.as_str())
            .map_err(|_| OtvetError::argument("base URL is not a valid Referer value"))?;
        headers.insert(header::REFERER, referer);

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("otvet/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(OtvetClient {
            http,
            jar,
            base_url,
            api_url,
            search_url,
            auth_url,
            session: RwLock::new(state),
            categories: OnceLock::new(),
            retry: self.retry,
            auto_renew: self.auto_renew,
        })
    }
}

fn parse_url(input: &str) -> Result<Url, OtvetError> {
    Url::parse(input).map_err(|error| OtvetError::argument(format!("invalid URL {input:?}: {error}")))
}

fn join_url(base: &Url, path: &str) -> Result<Url, OtvetError> {
    base.join(path)
        .map_err(|error| OtvetError::argument(format!("invalid base URL {base}: {error}")))
}

// ============================================================================
// Client
// ============================================================================

/// Client for the otvet.mail.ru API.
///
/// The client is cheap to share behind an `Arc` and all methods take
/// `&self`. Session state lives behind a lock and is replaced wholly by
/// every bootstrap; the category catalog is loaded once and kept for the
/// lifetime of the client.
#[derive(Debug)]
pub struct OtvetClient {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    api_url: Url,
    search_url: Url,
    auth_url: Url,
    session: RwLock<SessionState>,
    categories: OnceLock<Categories>,
    retry: RetryPolicy,
    auto_renew: bool,
}

impl OtvetClient {
    /// Anonymous client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Http`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, OtvetError> {
        Self::builder().build()
    }

    /// Starts configuring a client.
    pub fn builder() -> OtvetClientBuilder {
        OtvetClientBuilder::default()
    }

    /// Client restored from a previously exported session.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Parse`] when the snapshot carries only one
    /// half of the token/salt pair.
    pub fn from_snapshot(snapshot: AuthSnapshot) -> Result<Self, OtvetError> {
        Self::builder().snapshot(snapshot).build()
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Id of the authenticated user, if any.
    pub async fn user_id(&self) -> Option<u64> {
        self.session.read().await.user_id
    }

    /// Whether the client holds an authenticated session.
    pub async fn is_authenticated(&self) -> bool {
        self.user_id().await.is_some()
    }

    /// Adult-content flag of the authenticated user.
    ///
    /// Some categories are hidden from non-adult users; see
    /// [`set_adult_flag`](Self::set_adult_flag). Always `None` for
    /// anonymous sessions. Reloads the main page when the session was
    /// restored from a snapshot and the flag is not known yet.
    ///
    /// # Errors
    ///
    /// Propagates main page load failures.
    pub async fn is_adult(&self) -> Result<Option<bool>, OtvetError> {
        {
            let session = self.session.read().await;
            if session.is_adult.is_some() || session.user_id.is_none() {
                return Ok(session.is_adult);
            }
        }
        self.bootstrap().await?;
        Ok(self.session.read().await.is_adult)
    }

    /// Exports the session for later reuse.
    ///
    /// The snapshot can be serialized, stored and fed back through
    /// [`OtvetClient::from_snapshot`] to skip the password login.
    pub async fn auth_snapshot(&self) -> AuthSnapshot {
        let cookie = cookie_value(&self.jar, &self.base_url, SSO_COOKIE);
        self.session.read().await.snapshot(cookie)
    }

    /// The category catalog, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates main page load failures.
    pub async fn categories(&self) -> Result<&Categories, OtvetError> {
        if let Some(categories) = self.categories.get() {
            return Ok(categories);
        }
        self.bootstrap().await?;
        self.categories
            .get()
            .ok_or_else(|| OtvetError::parse("category catalog missing after bootstrap"))
    }

    /// Logs in with a mail.ru login and password.
    ///
    /// A login without an `@` gets `@mail.ru` appended. On success the
    /// session holds the token/salt pair and the user id.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Auth`] when the portal did not establish a
    /// session for these credentials.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<(), OtvetError> {
        let login = if login.contains('@') {
            login.to_owned()
        } else {
            format!("{login}@mail.ru")
        };
        let form = [
            ("Login", login.as_str()),
            ("Username", login.as_str()),
            ("Password", password),
        ];
        self.http
            .post(self.auth_url.clone())
            .form(&form)
            .send()
            .await?;
        self.bootstrap().await?;
        if self.session.read().await.user_id.is_none() {
            warn!(login = %login, "portal did not establish a session");
            return Err(OtvetError::Auth { login });
        }
        Ok(())
    }

    /// Loads the main page and rebuilds the session state from it.
    ///
    /// The state is replaced wholly: a page served without the token
    /// cookie resets the client to anonymous. The category catalog is
    /// extracted on the first load only.
    async fn bootstrap(&self) -> Result<(), OtvetError> {
        let mut url = self.base_url.clone();
        url.set_query(Some(MAIN_PAGE_QUERY));
        debug!(%url, "loading the main page");
        let page = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if self.categories.get().is_none() {
            let roots = session::extract_categories(&page)?;
            let _ = self.categories.set(Categories::new(roots));
        }

        let state = match cookie_value(&self.jar, &self.base_url, TOKEN_COOKIE) {
            Some(token) => {
                let markers = session::extract_markers(&page)?;
                SessionState {
                    auth: Some(AuthTokens {
                        token,
                        salt: markers.salt,
                    }),
                    user_id: Some(markers.user_id),
                    is_adult: Some(markers.is_adult),
                }
            }
            None => SessionState::default(),
        };
        debug!(user_id = ?state.user_id, "session state rebuilt");
        *self.session.write().await = state;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Call plumbing
    // ------------------------------------------------------------------

    async fn run(&self, target: Target<'_>, params: &Params) -> Result<Value, OtvetError> {
        let (Target::Api(method) | Target::Direct(method)) = target;
        debug!(method, "calling API method");
        let runner = ApiCall {
            client: self,
            target,
            params,
        };
        call::run_checked(&runner, &self.retry, self.auto_renew).await
    }

    /// The explicit user, falling back to the authenticated one.
    async fn resolve_user(&self, user: Option<u64>) -> Result<u64, OtvetError> {
        if let Some(user) = user {
            return Ok(user);
        }
        self.session.read().await.user_id.ok_or_else(|| {
            OtvetError::argument("Either authenticate the client or provide a user")
        })
    }

    async fn ensure_authenticated(&self) -> Result<(), OtvetError> {
        if self.session.read().await.user_id.is_none() {
            return Err(OtvetError::argument(
                "Authentication is required to call this method",
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Question listings
    // ------------------------------------------------------------------

    /// One page of the main question listing.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] for an unknown category and
    /// propagates call failures.
    pub async fn questions_page(
        &self,
        filter: &QuestionFilter,
        page: PageRequest,
    ) -> Result<Vec<QuestionPreview>, OtvetError> {
        let categories = self.categories().await?;
        let category = resolve_category(categories, filter.category.as_deref())?;
        let params = question_list_params(filter, category.map(|c| c.urlname.as_str()), page);
        let method = if filter.leaders_only {
            "/v2/leadqst"
        } else {
            "/v2/questlist"
        };
        let reply = self.run(Target::Api(method), &params).await?;
        wire::take_list::<WireQuestionPreview>(reply, "qst")?
            .into_iter()
            .map(|item| item.into_preview(categories))
            .collect()
    }

    /// Pager over the main question listing, from new to old.
    ///
    /// The listing is pinned to the first question seen, so new arrivals
    /// do not shift later pages.
    pub fn questions(&self, filter: QuestionFilter, step: u32) -> Pages<'_, QuestionPreview> {
        let fetch: PageFetch<'_, QuestionPreview> = Box::new(move |page| {
            let filter = filter.clone();
            Box::pin(async move { self.questions_page(&filter, page).await })
        });
        Pages::anchored(step, fetch)
    }

    /// Live stream of newly asked questions.
    ///
    /// Polls the head of the listing and yields only questions that are
    /// newer than everything seen before. When questions arrive faster
    /// than one window per poll, the overflow is skipped.
    pub fn new_questions(
        &self,
        filter: QuestionFilter,
        options: &LiveOptions,
    ) -> LiveFeed<'_, QuestionPreview> {
        let page = PageRequest {
            step: options.step,
            offset: 0,
            anchor: None,
        };
        let fetch: BatchFetch<'_, QuestionPreview> = Box::new(move || {
            let filter = filter.clone();
            Box::pin(async move { self.questions_page(&filter, page).await })
        });
        LiveFeed::new(options, fetch)
    }

    /// Promoted leader questions, as shown on the main page.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] for an unknown category and
    /// propagates call failures.
    pub async fn leader_questions(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<QuestionPreview>, OtvetError> {
        let categories = self.categories().await?;
        let category = resolve_category(categories, category)?;
        let params = Params::new().arg_opt("cat", category.map(|c| c.urlname.as_str()));
        let reply = self.run(Target::Api("/v2/leadqst"), &params).await?;
        wire::take_list::<WireQuestionPreview>(reply, "qst")?
            .into_iter()
            .map(|item| item.into_preview(categories))
            .collect()
    }

    /// One page of the best-questions rating.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] for an unknown category and
    /// propagates call failures.
    pub async fn best_questions_page(
        &self,
        category: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<BestQuestionPreview>, OtvetError> {
        let categories = self.categories().await?;
        let category = resolve_category(categories, category)?;
        let params = Params::new()
            .arg("state", "B")
            .arg("n", page.step)
            .arg_opt("cat", category.map(|c| c.urlname.as_str()))
            .arg("p", page.offset)
            .arg_opt("lastid", page.anchor);
        let reply = self.run(Target::Api("/v2/qstrating"), &params).await?;
        wire::take_list::<WireBestQuestionPreview>(reply, "qst")?
            .into_iter()
            .map(|item| item.into_preview(categories))
            .collect()
    }

    /// Pager over the best-questions rating.
    pub fn best_questions(
        &self,
        category: Option<String>,
        step: u32,
    ) -> Pages<'_, BestQuestionPreview> {
        let fetch: PageFetch<'_, BestQuestionPreview> = Box::new(move |page| {
            let category = category.clone();
            Box::pin(async move { self.best_questions_page(category.as_deref(), page).await })
        });
        Pages::anchored(step, fetch)
    }

    /// One page of the questions asked by a user.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when no user is given and the
    /// client is anonymous; propagates call failures.
    pub async fn user_questions_page(
        &self,
        user: Option<u64>,
        state: Option<QuestionState>,
        only_hidden: bool,
        page: PageRequest,
    ) -> Result<Vec<UserQuestionPreview>, OtvetError> {
        let user = self.resolve_user(user).await?;
        let categories = self.categories().await?;
        let mut params = Params::new()
            .arg("n", page.step)
            .arg("p", page.offset)
            .arg("user", user);
        if only_hidden {
            params = params.arg("hidden", 1);
        }
        let params = params.arg_opt("state", state.map(|s| s.code()));
        let reply = self.run(Target::Api("/v2/quserlist"), &params).await?;
        wire::take_list::<WireUserQuestionPreview>(reply, "qst")?
            .into_iter()
            .map(|item| item.into_preview(categories))
            .collect()
    }

    /// Pager over the questions asked by a user.
    pub fn user_questions(
        &self,
        user: Option<u64>,
        state: Option<QuestionState>,
        only_hidden: bool,
        step: u32,
    ) -> Pages<'_, UserQuestionPreview> {
        let fetch: PageFetch<'_, UserQuestionPreview> = Box::new(move |page| {
            Box::pin(async move {
                self.user_questions_page(user, state, only_hidden, page)
                    .await
            })
        });
        Pages::plain(step, fetch)
    }

    // ------------------------------------------------------------------
    // Answer listings
    // ------------------------------------------------------------------

    /// One page of the answers to a question.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn answers_page(
        &self,
        question: u64,
        page: PageRequest,
    ) -> Result<Vec<Answer>, OtvetError> {
        let params = Params::new()
            .arg("qid", question)
            .arg("n", page.step)
            .arg("p", page.offset)
            .arg("sort", 1);
        let reply = self.run(Target::Api("/v2/moreanswers"), &params).await?;
        wire::take_list::<WireAnswer>(reply, "answers")?
            .into_iter()
            .map(WireAnswer::into_answer)
            .collect()
    }

    /// Pager over the answers to a question.
    pub fn answers(&self, question: u64, step: u32) -> Pages<'_, Answer> {
        let fetch: PageFetch<'_, Answer> =
            Box::new(move |page| Box::pin(async move { self.answers_page(question, page).await }));
        Pages::plain(step, fetch)
    }

    /// One page of the answers given by a user.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when no user is given and the
    /// client is anonymous; propagates call failures.
    pub async fn user_answers_page(
        &self,
        user: Option<u64>,
        only_best: bool,
        page: PageRequest,
    ) -> Result<Vec<AnswerPreview>, OtvetError> {
        let user = self.resolve_user(user).await?;
        let categories = self.categories().await?;
        let mut params = Params::new()
            .arg("n", page.step)
            .arg("p", page.offset)
            .arg("usrid", user);
        if only_best {
            params = params.arg("best", 1);
        }
        let reply = self.run(Target::Api("/v2/auserlist"), &params).await?;
        wire::take_list::<WireAnswerPreview>(reply, "answers")?
            .into_iter()
            .map(|item| item.into_preview(categories))
            .collect()
    }

    /// Pager over the answers given by a user.
    pub fn user_answers(
        &self,
        user: Option<u64>,
        only_best: bool,
        step: u32,
    ) -> Pages<'_, AnswerPreview> {
        let fetch: PageFetch<'_, AnswerPreview> = Box::new(move |page| {
            Box::pin(async move { self.user_answers_page(user, only_best, page).await })
        });
        Pages::plain(step, fetch)
    }

    // ------------------------------------------------------------------
    // Vote and like listings
    // ------------------------------------------------------------------

    /// One page of the users who voted for a poll option.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn poll_votes_page(
        &self,
        option: u64,
        page: PageRequest,
    ) -> Result<Vec<PollVoter>, OtvetError> {
        let params = Params::new()
            .arg("optid", option)
            .arg("n", page.step)
            .arg("p", page.offset);
        let reply = self.run(Target::Api("/v2/whovoted"), &params).await?;
        wire::take_list::<WireSmallUser>(reply, "users")?
            .into_iter()
            .map(WireSmallUser::into_voter)
            .collect()
    }

    /// Pager over the users who voted for a poll option.
    pub fn poll_votes(&self, option: u64, step: u32) -> Pages<'_, PollVoter> {
        let fetch: PageFetch<'_, PollVoter> = Box::new(move |page| {
            Box::pin(async move { self.poll_votes_page(option, page).await })
        });
        Pages::plain(step, fetch)
    }

    /// One page of the users who liked a question.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn question_likes_page(
        &self,
        question: u64,
        page: PageRequest,
    ) -> Result<Vec<SmallUser>, OtvetError> {
        self.likes_page("qid", question, page).await
    }

    /// One page of the users who liked an answer.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn answer_likes_page(
        &self,
        answer: u64,
        page: PageRequest,
    ) -> Result<Vec<SmallUser>, OtvetError> {
        self.likes_page("aid", answer, page).await
    }

    async fn likes_page(
        &self,
        key: &'static str,
        id: u64,
        page: PageRequest,
    ) -> Result<Vec<SmallUser>, OtvetError> {
        let params = Params::new()
            .arg("n", page.step)
            .arg("p", page.offset)
            .arg(key, id);
        let reply = self.run(Target::Api("/v2/marked"), &params).await?;
        wire::take_list::<WireSmallUser>(reply, "marked")?
            .into_iter()
            .map(WireSmallUser::into_small_user)
            .collect()
    }

    /// Pager over the users who liked a question.
    pub fn question_likes(&self, question: u64, step: u32) -> Pages<'_, SmallUser> {
        let fetch: PageFetch<'_, SmallUser> = Box::new(move |page| {
            Box::pin(async move { self.question_likes_page(question, page).await })
        });
        Pages::plain(step, fetch)
    }

    /// Pager over the users who liked an answer.
    pub fn answer_likes(&self, answer: u64, step: u32) -> Pages<'_, SmallUser> {
        let fetch: PageFetch<'_, SmallUser> = Box::new(move |page| {
            Box::pin(async move { self.answer_likes_page(answer, page).await })
        });
        Pages::plain(step, fetch)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// One page of full-text search results.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] for an unknown category and
    /// propagates call failures.
    pub async fn search_page(
        &self,
        query: &str,
        options: &SearchOptions,
        page: PageRequest,
    ) -> Result<Vec<QuestionSearchResult>, OtvetError> {
        let categories = self.categories().await?;
        let params = search_params(categories, query, options, page)?;
        let reply = self
            .run(Target::Direct(self.search_url.as_str()), &params)
            .await?;
        wire::take_list::<WireSearchResult>(reply, "results")?
            .into_iter()
            .map(|item| item.into_result(categories))
            .collect()
    }

    /// Pager over full-text search results.
    pub fn search(
        &self,
        query: String,
        options: SearchOptions,
        step: u32,
    ) -> Pages<'_, QuestionSearchResult> {
        let fetch: PageFetch<'_, QuestionSearchResult> = Box::new(move |page| {
            let query = query.clone();
            let options = options.clone();
            Box::pin(async move { self.search_page(&query, &options, page).await })
        });
        Pages::plain(step, fetch)
    }

    // ------------------------------------------------------------------
    // Single objects
    // ------------------------------------------------------------------

    /// A full question with its first answers.
    ///
    /// `answer_count` bounds the prefetched answers; the rest come through
    /// [`answers`](Self::answers).
    ///
    /// # Errors
    ///
    /// Propagates call failures; an unknown id surfaces as
    /// [`OtvetError::Api`].
    pub async fn question(&self, question: u64, answer_count: u32) -> Result<Question, OtvetError> {
        let categories = self.categories().await?;
        let params = Params::new()
            .arg("qid", question)
            .arg("n", answer_count)
            .arg("p", 0)
            .arg("sort", 1);
        let reply = self.run(Target::Api("/v2/question"), &params).await?;
        let question: WireQuestion = serde_json::from_value(reply)?;
        question.into_question(categories)
    }

    /// A full user profile.
    ///
    /// For the authenticated user's own profile the result carries the
    /// own-profile extras.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when no user is given and the
    /// client is anonymous; propagates call failures.
    pub async fn user_profile(&self, user: Option<u64>) -> Result<UserProfile, OtvetError> {
        let user = self.resolve_user(user).await?;
        let params = Params::new().arg("user", user);
        let reply = self.run(Target::Api("/v2/stats_ex"), &params).await?;
        let profile: WireProfile = serde_json::from_value(reply)?;
        profile.into_profile(user)
    }

    /// Daily action limits of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn limits(&self) -> Result<Limits, OtvetError> {
        self.ensure_authenticated().await?;
        let reply = self.run(Target::Api("/v2/showlimits"), &Params::new()).await?;
        let limits: WireLimits = serde_json::from_value(reply)?;
        Ok(limits.into_limits())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Asks a question, returning the new question's id.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous, the
    /// category is unknown, or the category has subcategories; propagates
    /// call failures.
    pub async fn add_question(
        &self,
        category: &str,
        title: &str,
        options: &AskOptions,
    ) -> Result<u64, OtvetError> {
        let params = ask_params(title, options);
        self.submit_question(category, params).await
    }

    /// Creates a poll, returning the new question's id.
    ///
    /// `multiple` allows voting for more than one option.
    ///
    /// # Errors
    ///
    /// Same conditions as [`add_question`](Self::add_question).
    pub async fn add_poll(
        &self,
        category: &str,
        title: &str,
        poll_options: &[String],
        multiple: bool,
        options: &AskOptions,
    ) -> Result<u64, OtvetError> {
        let params = ask_params(title, options)
            .arg("poll", if multiple { "C" } else { "S" })
            .arg_each("poll_options[]", poll_options);
        self.submit_question(category, params).await
    }

    async fn submit_question(&self, category: &str, params: Params) -> Result<u64, OtvetError> {
        self.ensure_authenticated().await?;
        let categories = self.categories().await?;
        let category = resolve_category(categories, Some(category))?
            .ok_or_else(|| OtvetError::argument("A category is required"))?;
        if category.has_children() {
            return Err(OtvetError::argument(
                "Asking questions is allowed only in categories without subcategories",
            ));
        }
        let params = match category.parent {
            Some(parent) => params.arg("cid", parent).arg("subcid", category.id),
            None => params.arg("cid", category.id),
        };
        let reply = self.run(Target::Api("/v2/addqst"), &params).await?;
        let created: WireNewQuestion = serde_json::from_value(reply)?;
        Ok(created.qid)
    }

    /// Answers a question, returning the new answer's id.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn add_answer(&self, question: u64, text: &str) -> Result<u64, OtvetError> {
        self.ensure_authenticated().await?;
        let params = Params::new().arg("qid", question).arg("Body", text);
        let reply = self.run(Target::Api("/v2/addans"), &params).await?;
        let created: WireNewAnswer = serde_json::from_value(reply)?;
        Ok(created.result.id)
    }

    /// Votes for poll options.
    ///
    /// Polls without multiple choice accept exactly one option.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn vote_in_poll(&self, question: u64, options: &[u64]) -> Result<(), OtvetError> {
        self.ensure_authenticated().await?;
        let params = Params::new()
            .arg("qid", question)
            .arg_each("vote[]", options);
        self.run(Target::Api("/v2/votepoll"), &params).await?;
        Ok(())
    }

    /// Votes for the best answer of a question in the voting state.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn vote_for_best_answer(&self, question: u64, answer: u64) -> Result<(), OtvetError> {
        self.ensure_authenticated().await?;
        let params = Params::new().arg("qid", question).arg("aid", answer);
        self.run(Target::Api("/v2/votefor"), &params).await?;
        Ok(())
    }

    /// Chooses the best answer on the caller's own question.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn choose_best_answer(&self, answer: u64) -> Result<(), OtvetError> {
        self.ensure_authenticated().await?;
        let params = Params::new().arg("aid", answer);
        self.run(Target::Api("/v2/selectbest"), &params).await?;
        Ok(())
    }

    /// Likes a question, or takes the like back.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn like_question(&self, question: u64, remove: bool) -> Result<(), OtvetError> {
        self.like(Params::new().arg("qid", question), remove).await
    }

    /// Likes an answer, or takes the like back.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn like_answer(&self, answer: u64, remove: bool) -> Result<(), OtvetError> {
        self.like(Params::new().arg("aid", answer), remove).await
    }

    async fn like(&self, params: Params, remove: bool) -> Result<(), OtvetError> {
        self.ensure_authenticated().await?;
        let method = if remove { "/v2/unmark" } else { "/v2/mark" };
        self.run(Target::Api(method), &params).await?;
        Ok(())
    }

    /// Starts or stops watching a question for new answers.
    ///
    /// # Errors
    ///
    /// Returns [`OtvetError::Argument`] when the client is anonymous;
    /// propagates call failures.
    pub async fn watch_question(&self, question: u64, stop: bool) -> Result<(), OtvetError> {
        self.ensure_authenticated().await?;
        let method = if stop { "/v2/dropwatch" } else { "/v2/startwatch" };
        let params = Params::new().arg("qid", question);
        self.run(Target::Api(method), &params).await?;
        Ok(())
    }

    /// Marks the account as adult, unlocking the restricted categories.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn set_adult_flag(&self) -> Result<(), OtvetError> {
        self.run(Target::Api("/v2/iamadult"), &Params::new()).await?;
        Ok(())
    }
}

// ============================================================================
// Parameter assembly
// ============================================================================

fn resolve_category<'c>(
    categories: &'c Categories,
    input: Option<&str>,
) -> Result<Option<&'c Category>, OtvetError> {
    match input {
        None | Some("") => Ok(None),
        Some(name) => categories
            .by_urlname(name)
            .or_else(|| categories.by_name(name))
            .map(Some)
            .ok_or_else(|| OtvetError::argument(format!("No such category: {name}"))),
    }
}

fn question_list_params(
    filter: &QuestionFilter,
    category: Option<&str>,
    page: PageRequest,
) -> Params {
    let mut params = Params::new();
    if let Some(state) = filter.state {
        params = params.arg("state", state.code());
    }
    // The default open/all-categories listing sends the exclusion key even
    // when it is empty; other listings only send it when one was given.
    let default_listing =
        filter.state == Some(QuestionState::Open) && category.is_none() && !filter.leaders_only;
    if filter.category_exclude.is_some() || default_listing {
        params = params.arg(
            "category_exclude",
            filter.category_exclude.as_deref().unwrap_or(""),
        );
    }
    params
        .arg_opt("cat", category)
        .arg("p", page.offset)
        .arg_opt("lastid", page.anchor)
        .arg("n", page.step)
}

fn ask_params(title: &str, options: &AskOptions) -> Params {
    Params::new()
        .arg("Body", &options.text)
        .arg("qtext", title)
        .arg("cancmt", i32::from(options.allow_comments))
        .arg("watch", i32::from(options.watch))
}

fn search_params(
    categories: &Categories,
    query: &str,
    options: &SearchOptions,
    page: PageRequest,
) -> Result<Params, OtvetError> {
    let mut params = Params::new()
        .arg("num", page.step)
        .arg("sf", page.offset)
        .arg("q", query);
    if options.sort_by_date {
        params = params.arg("sort", "date");
    }
    if let Some(state) = options.state {
        let rank = match state {
            QuestionState::Open => 3,
            QuestionState::Vote => 2,
            QuestionState::Resolve => 1,
        };
        params = params.arg("zvstate", rank);
    }
    if let Some(input) = options.category.as_deref() {
        let category = resolve_category(categories, Some(input))?
            .ok_or_else(|| OtvetError::argument("A category is required"))?;
        params = params.arg("zVCat", category.id);
    }
    if let Some(days) = options.last_days {
        params = params.arg("zdts", -((days * 86400.0) as i64));
    }
    if options.questions_only {
        params = params.arg("question_only", 1);
    }
    Ok(params)
}

// ============================================================================
// Transport binding
// ============================================================================

/// One logical call bound to the client's transport and session.
struct ApiCall<'a> {
    client: &'a OtvetClient,
    target: Target<'a>,
    params: &'a Params,
}

#[async_trait]
impl CallRunner for ApiCall<'_> {
    async fn attempt(&self) -> Result<RawOutcome, OtvetError> {
        let auth = self.client.session.read().await.auth_params();
        let sent = match self.target {
            Target::Api(method) => {
                let mut form = self.params.pairs().to_vec();
                form.extend(auth);
                form.push(("__urlp", method.to_owned()));
                self.client
                    .http
                    .post(self.client.api_url.clone())
                    .form(&form)
                    .send()
                    .await
            }
            Target::Direct(url) => {
                let mut query = self.params.pairs().to_vec();
                query.extend(auth);
                self.client.http.get(url).query(&query).send().await
            }
        };
        let response = match sent {
            Ok(response) => response,
            Err(error) if is_transient(&error) => {
                return Ok(RawOutcome::Transient(error.into()));
            }
            Err(error) => return Err(error.into()),
        };
        let body = response.text().await?;
        Ok(RawOutcome::Reply(serde_json::from_str(&body)?))
    }

    async fn renew(&self) -> Result<(), OtvetError> {
        self.client.bootstrap().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use otvet_core::CategoryNode;

    fn catalog() -> Categories {
        let roots: Vec<CategoryNode> = serde_json::from_str(
            r#"[
                {"id": 14, "urlname": "auto", "name": "Авто, Мото", "position": 1,
                 "readonly": 0,
                 "categories": [{"id": 77, "urlname": "gibdd", "name": "ГИБДД",
                                 "position": 1, "readonly": 0}]},
                {"id": 20, "urlname": "computers", "name": "Компьютеры, Связь",
                 "position": 2, "readonly": 0}
            ]"#,
        )
        .unwrap();
        Categories::new(roots)
    }

    fn keys(params: &Params) -> Vec<&'static str> {
        params.pairs().iter().map(|(key, _)| *key).collect()
    }

    fn value_of(params: &Params, key: &str) -> Option<String> {
        params
            .pairs()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn test_default_listing_sends_empty_exclusion() {
        let params = question_list_params(&QuestionFilter::default(), None, PageRequest::default());
        assert_eq!(
            keys(&params),
            vec!["state", "category_exclude", "p", "n"]
        );
        assert_eq!(value_of(&params, "state").as_deref(), Some("A"));
        assert_eq!(value_of(&params, "category_exclude").as_deref(), Some(""));
    }

    #[test]
    fn test_filtered_listing_omits_exclusion() {
        let filter = QuestionFilter {
            state: Some(QuestionState::Resolve),
            ..QuestionFilter::default()
        };
        let params = question_list_params(&filter, Some("auto"), PageRequest::default());
        assert_eq!(keys(&params), vec!["state", "cat", "p", "n"]);

        let filter = QuestionFilter {
            category_exclude: Some("travel".to_owned()),
            ..filter
        };
        let params = question_list_params(&filter, Some("auto"), PageRequest::default());
        assert_eq!(value_of(&params, "category_exclude").as_deref(), Some("travel"));
    }

    #[test]
    fn test_anchor_and_offset_are_forwarded() {
        let page = PageRequest {
            step: 50,
            offset: 100,
            anchor: Some(243_000_000),
        };
        let params = question_list_params(&QuestionFilter::default(), None, page);
        assert_eq!(value_of(&params, "p").as_deref(), Some("100"));
        assert_eq!(value_of(&params, "lastid").as_deref(), Some("243000000"));
        assert_eq!(value_of(&params, "n").as_deref(), Some("50"));
    }

    #[test]
    fn test_resolve_category() {
        let categories = catalog();
        let by_urlname = resolve_category(&categories, Some("gibdd")).unwrap();
        assert_eq!(by_urlname.map(|c| c.id), Some(77));
        // Display names resolve case-insensitively.
        let by_name = resolve_category(&categories, Some("авто, мото")).unwrap();
        assert_eq!(by_name.map(|c| c.id), Some(14));
        assert_eq!(resolve_category(&categories, None).unwrap(), None);
        assert_eq!(resolve_category(&categories, Some("")).unwrap(), None);
        assert!(matches!(
            resolve_category(&categories, Some("nope")),
            Err(OtvetError::Argument(_))
        ));
    }

    #[test]
    fn test_search_params() {
        let options = SearchOptions {
            sort_by_date: true,
            state: Some(QuestionState::Open),
            category: Some("auto".to_owned()),
            last_days: Some(1.5),
            questions_only: true,
        };
        let page = PageRequest {
            step: 10,
            offset: 30,
            anchor: None,
        };
        let params = search_params(&catalog(), "борщ", &options, page).unwrap();
        assert_eq!(value_of(&params, "num").as_deref(), Some("10"));
        assert_eq!(value_of(&params, "sf").as_deref(), Some("30"));
        assert_eq!(value_of(&params, "q").as_deref(), Some("борщ"));
        assert_eq!(value_of(&params, "sort").as_deref(), Some("date"));
        assert_eq!(value_of(&params, "zvstate").as_deref(), Some("3"));
        assert_eq!(value_of(&params, "zVCat").as_deref(), Some("14"));
        assert_eq!(value_of(&params, "zdts").as_deref(), Some("-129600"));
        assert_eq!(value_of(&params, "question_only").as_deref(), Some("1"));
    }

    #[test]
    fn test_search_params_minimal() {
        let params = search_params(
            &catalog(),
            "борщ",
            &SearchOptions::default(),
            PageRequest::default(),
        )
        .unwrap();
        assert_eq!(keys(&params), vec!["num", "sf", "q"]);
    }

    #[test]
    fn test_ask_params_flags() {
        let options = AskOptions {
            text: "подробности".to_owned(),
            allow_comments: false,
            watch: true,
        };
        let params = ask_params("Как так?", &options);
        assert_eq!(value_of(&params, "Body").as_deref(), Some("подробности"));
        assert_eq!(value_of(&params, "qtext").as_deref(), Some("Как так?"));
        assert_eq!(value_of(&params, "cancmt").as_deref(), Some("0"));
        assert_eq!(value_of(&params, "watch").as_deref(), Some("1"));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = OtvetClient::builder().base_url("not a url").build();
        assert!(matches!(result, Err(OtvetError::Argument(_))));
    }

    #[test]
    fn test_builder_rejects_half_snapshot() {
        let snapshot = AuthSnapshot {
            salt: Some("slt".to_owned()),
            ..AuthSnapshot::default()
        };
        let result = OtvetClient::from_snapshot(snapshot);
        assert!(matches!(result, Err(OtvetError::Parse(_))));
    }
}
