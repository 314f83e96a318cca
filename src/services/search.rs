//! Search, autocomplete, curated lists, facets and similarity lookups.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use rand::Rng;
use serde_json::json;

use crate::domain::listing::{ListingWithProvider, PricePoint};
use crate::domain::search::{
    IncludeOptions, MIN_SUGGESTION_TERM_CHARS, SearchQuery, SuggestionKind, SuggestionRequest,
};
use crate::domain::types::{ListingId, ListingStatus};
use crate::dto::search::{
    AppliedFilters, ImagePreview, ReviewPreview, SearchResponse, SearchResultItem, Suggestion,
};
use crate::engine::diversify::diversify;
use crate::engine::filters::build_filter;
use crate::engine::geo::distance_km;
use crate::engine::ranking::{RankedCandidate, attach_distances, sort_candidates, within_radius};
use crate::engine::similar::{fetch_cap, vary_order};
use crate::engine::statistics::{
    CategoryCount, LocationCount, PriceRange, SearchStatistics, compute_statistics,
    count_locations, price_range,
};
use crate::forms::search::{LimitForm, SearchForm, SuggestionForm, normalize_query};
use crate::models::config::SearchSettings;
use crate::pagination::{paginate, total_pages};
use crate::repository::errors::RepositoryError;
use crate::repository::{
    FacetReader, ListingFilter, ListingOrder, ListingQuery, ListingReader, MediaReader,
};
use crate::services::{ServiceError, ServiceResult};

pub const DEFAULT_CURATED_LIMIT: usize = 10;
pub const MAX_CURATED_LIMIT: usize = 50;
pub const DEFAULT_SIMILAR_LIMIT: usize = 6;
pub const MAX_SIMILAR_LIMIT: usize = 20;

/// The requested page together with the size of the set it was cut from.
struct RankedPage {
    total: usize,
    page: Vec<RankedCandidate>,
    /// Price points of the whole in-radius set, for geo queries only.
    points: Option<Vec<PricePoint>>,
    diversified: bool,
}

fn price_points(candidates: &[RankedCandidate]) -> Vec<PricePoint> {
    candidates
        .iter()
        .map(|ranked| PricePoint {
            price: ranked.candidate.listing.price,
            category: ranked.candidate.listing.category.clone(),
        })
        .collect()
}

/// Retrieves candidates and orders them.
///
/// Geo queries and diversified relevance queries load at most
/// `candidate_window` rows and rank in memory; every other query lets the
/// store sort and slice the page.
fn rank_candidates<R, G>(
    repo: &R,
    query: &SearchQuery,
    filter: &ListingFilter,
    settings: &SearchSettings,
    rng: &mut G,
) -> ServiceResult<RankedPage>
where
    R: ListingReader + ?Sized,
    G: Rng + ?Sized,
{
    let store_order = ListingOrder::from_sort(query.sort_by, query.sort_order);
    let window = ListingQuery::new(filter.clone()).paginate(1, settings.candidate_window);

    if let Some(origin) = query.origin {
        let candidates = repo.find_listings(&window.order(store_order))?;
        let loaded = candidates.len();
        let mut ranked = within_radius(attach_distances(candidates, Some(origin)), query.radius_km);
        log::debug!(
            "Geo search kept {} of {loaded} candidates within {} km",
            ranked.len(),
            query.radius_km
        );

        let points = price_points(&ranked);
        let diversified = query.wants_diversification();
        if diversified {
            ranked = diversify(ranked, RankedCandidate::location, rng);
        } else {
            sort_candidates(&mut ranked, query.sort_by, query.sort_order);
        }

        return Ok(RankedPage {
            total: ranked.len(),
            page: paginate(ranked, query.page, query.limit),
            points: Some(points),
            diversified,
        });
    }

    let total = repo.count_listings(filter)?;

    if query.wants_diversification() {
        let candidates = repo.find_listings(&window)?;
        if total > candidates.len() {
            log::debug!(
                "Diversifying {} of {total} candidates (window {})",
                candidates.len(),
                settings.candidate_window
            );
        }
        let ranked = diversify(attach_distances(candidates, None), RankedCandidate::location, rng);
        return Ok(RankedPage {
            total,
            page: paginate(ranked, query.page, query.limit),
            points: None,
            diversified: true,
        });
    }

    let rows = repo.find_listings(
        &ListingQuery::new(filter.clone())
            .order(store_order)
            .paginate(query.page, query.limit),
    )?;
    Ok(RankedPage {
        total,
        page: attach_distances(rows, None),
        points: None,
        diversified: false,
    })
}

/// Projects ranked candidates into response items, attaching image and
/// review previews when requested. A failed preview lookup leaves the
/// previews empty.
fn project<R>(
    repo: &R,
    ranked: Vec<RankedCandidate>,
    include: IncludeOptions,
    per_listing: usize,
) -> Vec<SearchResultItem>
where
    R: MediaReader + ?Sized,
{
    let ids: Vec<ListingId> = ranked.iter().map(|r| r.candidate.listing.id).collect();

    let mut images: HashMap<ListingId, Vec<ImagePreview>> = HashMap::new();
    if include.images && !ids.is_empty() {
        match repo.list_images(&ids) {
            Ok(rows) => {
                for image in rows {
                    let previews = images.entry(image.listing_id).or_default();
                    if previews.len() < per_listing {
                        previews.push(image.into());
                    }
                }
            }
            Err(err) => log::warn!("Failed to load image previews: {err}"),
        }
    }

    let mut reviews: HashMap<ListingId, Vec<ReviewPreview>> = HashMap::new();
    if include.reviews && !ids.is_empty() {
        match repo.list_recent_reviews(&ids) {
            Ok(rows) => {
                for review in rows {
                    let previews = reviews.entry(review.listing_id).or_default();
                    if previews.len() < per_listing {
                        previews.push(review.into());
                    }
                }
            }
            Err(err) => log::warn!("Failed to load review previews: {err}"),
        }
    }

    ranked
        .into_iter()
        .map(|ranked| {
            let id = ranked.candidate.listing.id;
            let mut item = SearchResultItem::new(&ranked.candidate, ranked.distance_km, include);
            if include.images {
                item.images = Some(images.remove(&id).unwrap_or_default());
            }
            if include.reviews {
                item.reviews = Some(reviews.remove(&id).unwrap_or_default());
            }
            item
        })
        .collect()
}

/// Up to `limit` distinct categories containing `term`. Short terms never
/// reach the store; failures yield an empty list.
fn related_terms<R>(repo: &R, term: Option<&str>, limit: usize) -> Vec<String>
where
    R: FacetReader + ?Sized,
{
    let Some(term) = term.filter(|term| term.chars().count() >= MIN_SUGGESTION_TERM_CHARS) else {
        return Vec::new();
    };

    match repo.list_matching_categories(term, limit) {
        Ok(categories) => categories,
        Err(err) => {
            log::warn!("Failed to build related search terms: {err}");
            Vec::new()
        }
    }
}

/// Statistics and suggestions, computed concurrently. Neither can fail the
/// request.
fn derived_sections<R>(
    repo: &R,
    term: Option<&str>,
    filter: &ListingFilter,
    points: Option<Vec<PricePoint>>,
    settings: &SearchSettings,
) -> (SearchStatistics, Vec<String>)
where
    R: ListingReader + FacetReader + Sync + ?Sized,
{
    std::thread::scope(|scope| {
        let statistics = scope.spawn(move || match points {
            Some(points) => Ok(compute_statistics(&points)),
            None => repo
                .list_price_points(filter)
                .map(|points| compute_statistics(&points)),
        });

        let suggestions = related_terms(repo, term, settings.suggestion_limit);

        let statistics = match statistics.join() {
            Ok(Ok(statistics)) => statistics,
            Ok(Err(err)) => {
                log::warn!("Failed to compute search statistics: {err}");
                SearchStatistics::default()
            }
            Err(_) => {
                log::warn!("Search statistics worker panicked");
                SearchStatistics::default()
            }
        };

        (statistics, suggestions)
    })
}

/// Runs a search for an already typed query.
pub fn search_listings<R, G>(
    repo: &R,
    query: SearchQuery,
    settings: &SearchSettings,
    rng: &mut G,
) -> ServiceResult<SearchResponse>
where
    R: ListingReader + MediaReader + FacetReader + Sync + ?Sized,
    G: Rng + ?Sized,
{
    let started = Instant::now();
    let query = normalize_query(query)?;
    let filter = build_filter(&query);

    let ranked = rank_candidates(repo, &query, &filter, settings, rng).map_err(|err| {
        log::error!("Failed to retrieve search candidates: {err}");
        err
    })?;

    let results = project(repo, ranked.page, query.include, settings.preview_limit);
    let (statistics, suggestions) = derived_sections(
        repo,
        query.term.as_deref(),
        &filter,
        ranked.points,
        settings,
    );

    let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    log::debug!(
        "Search {:?}: {} of {} results, diversified: {}, {execution_time_ms} ms",
        query.term,
        results.len(),
        ranked.total,
        ranked.diversified
    );

    Ok(SearchResponse {
        results,
        total: ranked.total,
        page: query.page,
        limit: query.limit,
        total_pages: total_pages(ranked.total, query.limit),
        query: query.term.clone(),
        filters: AppliedFilters::from(&query),
        execution_time_ms,
        suggestions,
        statistics,
    })
}

/// `GET /search` and `POST /search`.
pub fn search<R>(
    repo: &R,
    form: SearchForm,
    settings: &SearchSettings,
) -> ServiceResult<SearchResponse>
where
    R: ListingReader + MediaReader + FacetReader + Sync + ?Sized,
{
    let query = form.into_query()?;
    search_listings(repo, query, settings, &mut rand::rng())
}

/// `GET /search/nearby`.
pub fn search_nearby<R>(
    repo: &R,
    form: SearchForm,
    settings: &SearchSettings,
) -> ServiceResult<SearchResponse>
where
    R: ListingReader + MediaReader + FacetReader + Sync + ?Sized,
{
    let query = form.into_nearby_query()?;
    search_listings(repo, query, settings, &mut rand::rng())
}

fn service_suggestion(ranked: &RankedCandidate) -> Suggestion {
    let ListingWithProvider { listing, provider } = &ranked.candidate;
    let mut metadata = json!({
        "price": listing.price,
        "provider": provider.name,
        "city": provider.city,
    });
    if let Some(distance) = ranked.distance_km {
        metadata["distanceKm"] = json!(distance);
    }
    Suggestion {
        text: listing.name.clone(),
        kind: SuggestionKind::Service,
        id: Some(listing.id.get()),
        metadata,
    }
}

fn business_suggestion(ranked: &RankedCandidate) -> Suggestion {
    let provider = &ranked.candidate.provider;
    Suggestion {
        text: provider.name.clone(),
        kind: SuggestionKind::Business,
        id: Some(provider.id.get()),
        metadata: json!({
            "city": provider.city,
            "rating": provider.rating,
            "reviewCount": provider.review_count,
        }),
    }
}

/// Takes one entry from each list in turn until `limit` is reached.
fn interleave(groups: Vec<Vec<Suggestion>>, limit: usize) -> Vec<Suggestion> {
    let mut queues: Vec<VecDeque<Suggestion>> = groups.into_iter().map(VecDeque::from).collect();
    let mut merged = Vec::new();

    while merged.len() < limit && queues.iter().any(|queue| !queue.is_empty()) {
        for queue in &mut queues {
            if merged.len() == limit {
                break;
            }
            if let Some(suggestion) = queue.pop_front() {
                merged.push(suggestion);
            }
        }
    }

    merged
}

/// Typed autocomplete entries for a validated request.
pub fn suggest<R>(
    repo: &R,
    request: &SuggestionRequest,
    settings: &SearchSettings,
) -> ServiceResult<Vec<Suggestion>>
where
    R: ListingReader + FacetReader + ?Sized,
{
    if !request.is_searchable() {
        return Ok(Vec::new());
    }

    let kinds = request.kinds();
    let term = request.term.as_str();
    let needle = term.to_lowercase();
    let mut groups: Vec<Vec<Suggestion>> = Vec::new();

    if kinds.contains(&SuggestionKind::Service) || kinds.contains(&SuggestionKind::Business) {
        let matches = repo.list_name_matches(
            term,
            &ListingFilter::active().available_only(),
            settings.candidate_window,
        )?;
        let mut ranked = attach_distances(matches, request.origin);
        if request.origin.is_some() {
            ranked = within_radius(ranked, request.radius_km);
        }

        if kinds.contains(&SuggestionKind::Service) {
            groups.push(
                ranked
                    .iter()
                    .filter(|r| r.candidate.listing.name.to_lowercase().contains(&needle))
                    .take(request.limit)
                    .map(service_suggestion)
                    .collect(),
            );
        }

        if kinds.contains(&SuggestionKind::Business) {
            let mut seen = HashSet::new();
            groups.push(
                ranked
                    .iter()
                    .filter(|r| r.candidate.provider.name.to_lowercase().contains(&needle))
                    .filter(|r| seen.insert(r.candidate.provider.id))
                    .take(request.limit)
                    .map(business_suggestion)
                    .collect(),
            );
        }
    }

    if kinds.contains(&SuggestionKind::Category) {
        let mut categories = Vec::new();
        for category in repo.list_matching_categories(term, request.limit)? {
            let count = repo.count_listings(
                &ListingFilter::active()
                    .available_only()
                    .category(category.clone()),
            )?;
            categories.push(Suggestion {
                text: category,
                kind: SuggestionKind::Category,
                id: None,
                metadata: json!({ "count": count }),
            });
        }
        groups.push(categories);
    }

    Ok(interleave(groups, request.limit))
}

/// `GET /search/suggestions`.
pub fn suggestions<R>(
    repo: &R,
    form: SuggestionForm,
    settings: &SearchSettings,
) -> ServiceResult<Vec<Suggestion>>
where
    R: ListingReader + FacetReader + ?Sized,
{
    let request = form.into_request()?;
    suggest(repo, &request, settings).map_err(|err| {
        log::error!("Failed to build suggestions: {err}");
        err
    })
}

fn items(candidates: &[ListingWithProvider]) -> Vec<SearchResultItem> {
    candidates
        .iter()
        .map(|candidate| SearchResultItem::new(candidate, None, IncludeOptions::default()))
        .collect()
}

/// Best rated providers' listings.
pub fn popular<R>(repo: &R, form: &LimitForm) -> ServiceResult<Vec<SearchResultItem>>
where
    R: ListingReader + ?Sized,
{
    let limit = form.resolve(DEFAULT_CURATED_LIMIT, MAX_CURATED_LIMIT)?;
    let rows = repo.find_listings(
        &ListingQuery::new(ListingFilter::active().available_only())
            .order(ListingOrder::Popularity)
            .paginate(1, limit),
    )?;
    Ok(items(&rows))
}

/// Discounted listings, largest discount first.
pub fn discounted<R>(
    repo: &R,
    form: &LimitForm,
    settings: &SearchSettings,
) -> ServiceResult<Vec<SearchResultItem>>
where
    R: ListingReader + ?Sized,
{
    let limit = form.resolve(DEFAULT_CURATED_LIMIT, MAX_CURATED_LIMIT)?;
    let mut rows = repo.find_listings(
        &ListingQuery::new(ListingFilter::active().available_only().with_discount())
            .paginate(1, settings.candidate_window),
    )?;
    rows.sort_by_key(|row| std::cmp::Reverse(row.listing.discount_percent()));
    rows.truncate(limit);
    Ok(items(&rows))
}

pub fn categories<R>(repo: &R) -> ServiceResult<Vec<CategoryCount>>
where
    R: ListingReader + ?Sized,
{
    let points = repo.list_price_points(&ListingFilter::active())?;
    Ok(compute_statistics(&points).categories)
}

pub fn global_price_range<R>(repo: &R) -> ServiceResult<PriceRange>
where
    R: ListingReader + ?Sized,
{
    let points = repo.list_price_points(&ListingFilter::active())?;
    Ok(price_range(&points))
}

pub fn locations<R>(repo: &R) -> ServiceResult<Vec<LocationCount>>
where
    R: FacetReader + ?Sized,
{
    Ok(count_locations(repo.list_provider_locations()?))
}

/// Listings resembling `listing_id`, in a randomized order. A missing or
/// inactive reference yields an empty list.
pub fn similar_listings<R, G>(
    repo: &R,
    listing_id: i32,
    limit: usize,
    rng: &mut G,
) -> ServiceResult<Vec<SearchResultItem>>
where
    R: ListingReader + ?Sized,
    G: Rng + ?Sized,
{
    let id = ListingId::new(listing_id)
        .map_err(|_| ServiceError::Validation(vec!["listingId".to_string()]))?;

    let reference = match repo.get_listing_by_id(id) {
        Ok(Some(reference)) if reference.listing.status == ListingStatus::Active => reference,
        Ok(_) | Err(RepositoryError::NotFound) => {
            log::debug!("No active reference listing {id} for similarity search");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };

    let candidates = repo.list_similar_candidates(&reference.listing, fetch_cap(limit))?;
    let anchor = reference.provider.coordinates;

    Ok(vary_order(candidates, &reference, rng)
        .into_iter()
        .take(limit)
        .map(|candidate| {
            let distance = anchor
                .zip(candidate.provider.coordinates)
                .map(|(from, to)| distance_km(from, to));
            SearchResultItem::new(&candidate, distance, IncludeOptions::default())
        })
        .collect())
}

/// `GET /search/similar/{listing_id}`.
pub fn similar<R>(repo: &R, listing_id: i32, form: &LimitForm) -> ServiceResult<Vec<SearchResultItem>>
where
    R: ListingReader + ?Sized,
{
    let limit = form.resolve(DEFAULT_SIMILAR_LIMIT, MAX_SIMILAR_LIMIT)?;
    similar_listings(repo, listing_id, limit, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::listing::Listing;
    use crate::domain::provider::Provider;
    use crate::domain::search::{SortBy, SortOrder};
    use crate::domain::types::{Coordinates, ProviderId};
    use crate::repository::mock::MockRepository;

    const SANTIAGO: (f64, f64) = (-33.4489, -70.6693);

    fn candidate(id: i32, price: f64, city: &str, region: &str) -> ListingWithProvider {
        let created_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid date");
        ListingWithProvider {
            listing: Listing {
                id: ListingId::new(id).expect("valid id"),
                provider_id: ProviderId::new(id).expect("valid id"),
                name: format!("Lavado premium {id}"),
                description: "Lavado completo".into(),
                category: "premium".into(),
                price,
                discounted_price: None,
                duration_minutes: 60,
                is_available: true,
                status: ListingStatus::Active,
                created_at,
                updated_at: created_at,
            },
            provider: Provider {
                id: ProviderId::new(id).expect("valid id"),
                name: format!("Autolavado {id}"),
                category: "carwash".into(),
                street: "Calle 1".into(),
                city: city.into(),
                region: region.into(),
                coordinates: None,
                is_verified: true,
                rating: 4.5,
                review_count: 10,
            },
        }
    }

    /// A Santiago provider `km` kilometres north of the city centre.
    fn located(id: i32, km: f64) -> ListingWithProvider {
        let mut candidate = candidate(id, 10000.0, "Santiago", "Metropolitana");
        candidate.provider.coordinates =
            Some(Coordinates::new(SANTIAGO.0 + km / 111.195, SANTIAGO.1).expect("valid"));
        candidate
    }

    fn query(term: &str) -> SearchQuery {
        SearchQuery {
            term: Some(term.to_string()),
            ..SearchQuery::default()
        }
    }

    fn ids(items: &[SearchResultItem]) -> Vec<i32> {
        items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn short_suggestion_terms_never_touch_the_store() {
        let repo = MockRepository::new();
        let settings = SearchSettings::default();

        let result = suggest(&repo, &SuggestionRequest::new("la"), &settings).expect("ok");
        assert!(result.is_empty());

        let result = related_terms(&repo, Some("la"), 5);
        assert!(result.is_empty());
    }

    #[test]
    fn suggestions_mix_every_kind() {
        let mut repo = MockRepository::new();
        repo.expect_list_name_matches()
            .returning(|_, _, _| Ok(vec![candidate(1, 9000.0, "Santiago", "Metropolitana")]));
        repo.expect_list_matching_categories()
            .returning(|_, _| Ok(vec!["lavado express".to_string()]));
        repo.expect_count_listings().returning(|_| Ok(4));

        let request = SuggestionRequest::new("lav");
        let result = suggest(&repo, &request, &SearchSettings::default()).expect("ok");

        let kinds: Vec<SuggestionKind> = result.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SuggestionKind::Service,
                SuggestionKind::Business,
                SuggestionKind::Category
            ]
        );
        assert_eq!(result[0].id, Some(1));
        assert_eq!(result[1].text, "Autolavado 1");
        assert_eq!(result[2].metadata, json!({ "count": 4 }));
    }

    #[test]
    fn geo_search_excludes_listings_outside_radius() {
        let mut repo = MockRepository::new();
        repo.expect_find_listings()
            .times(1)
            .returning(|_| Ok(vec![located(1, 3.0), located(2, 8.0)]));
        repo.expect_list_matching_categories()
            .returning(|_, _| Ok(vec!["premium".to_string()]));

        let query = SearchQuery {
            origin: Some(Coordinates::new(SANTIAGO.0, SANTIAGO.1).expect("valid")),
            radius_km: 5.0,
            ..query("lavado")
        };
        let mut rng = StdRng::seed_from_u64(1);
        let response =
            search_listings(&repo, query, &SearchSettings::default(), &mut rng).expect("ok");

        assert_eq!(ids(&response.results), vec![1]);
        assert_eq!(response.total, 1);
        assert!(
            response
                .results
                .iter()
                .all(|item| item.distance_km.is_some_and(|d| d <= 5.0))
        );
        assert_eq!(response.statistics.price_range.min, 10000.0);
        assert_eq!(response.suggestions, vec!["premium".to_string()]);
    }

    #[test]
    fn suggestions_near_an_origin_stay_within_radius() {
        let mut repo = MockRepository::new();
        repo.expect_list_name_matches()
            .returning(|_, _, _| Ok(vec![located(1, 3.0), located(2, 8.0)]));
        repo.expect_list_matching_categories()
            .returning(|_, _| Ok(Vec::new()));

        let request = SuggestionRequest {
            origin: Some(Coordinates::new(SANTIAGO.0, SANTIAGO.1).expect("valid")),
            radius_km: 5.0,
            ..SuggestionRequest::new("lav")
        };
        let result = suggest(&repo, &request, &SearchSettings::default()).expect("ok");

        let kinds: Vec<SuggestionKind> = result.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SuggestionKind::Service, SuggestionKind::Business]);
        assert!(result.iter().all(|s| s.id == Some(1)));

        let distance = result[0].metadata["distanceKm"]
            .as_f64()
            .expect("service carries its distance");
        assert!((distance - 3.0).abs() < 0.05, "distance was {distance}");
    }

    #[test]
    fn preview_failures_leave_results_intact() {
        let mut repo = MockRepository::new();
        repo.expect_count_listings().returning(|_| Ok(1));
        repo.expect_find_listings()
            .returning(|_| Ok(vec![candidate(1, 9000.0, "Santiago", "Metropolitana")]));
        repo.expect_list_images()
            .returning(|_| Err(RepositoryError::ConnectionError("down".into())));
        repo.expect_list_recent_reviews()
            .returning(|_| Err(RepositoryError::ConnectionError("down".into())));
        repo.expect_list_price_points().returning(|_| Ok(Vec::new()));
        repo.expect_list_matching_categories()
            .returning(|_, _| Ok(Vec::new()));

        let query = SearchQuery {
            sort_by: SortBy::Price,
            include: IncludeOptions {
                provider: true,
                images: true,
                reviews: true,
            },
            ..query("lavado")
        };
        let mut rng = StdRng::seed_from_u64(1);
        let response =
            search_listings(&repo, query, &SearchSettings::default(), &mut rng).expect("ok");

        assert_eq!(ids(&response.results), vec![1]);
        assert_eq!(response.results[0].images, Some(Vec::new()));
        assert_eq!(response.results[0].reviews, Some(Vec::new()));
    }

    #[test]
    fn store_sorted_queries_are_paged_by_the_store() {
        let mut repo = MockRepository::new();
        repo.expect_count_listings().returning(|_| Ok(45));
        repo.expect_find_listings()
            .withf(|query| {
                query.pagination.as_ref().is_some_and(|p| p.page == 1 && p.per_page == 20)
                    && query.order == ListingOrder::Price(SortOrder::Asc)
            })
            .returning(|_| {
                Ok((1..=20)
                    .map(|id| candidate(id, 5000.0 + f64::from(id), "Santiago", "Metropolitana"))
                    .collect())
            });
        repo.expect_list_price_points().returning(|_| {
            Ok(vec![
                PricePoint {
                    price: 5000.0,
                    category: "premium".into(),
                },
                PricePoint {
                    price: 50000.0,
                    category: "premium".into(),
                },
            ])
        });
        repo.expect_list_matching_categories().returning(|_, _| Ok(Vec::new()));

        let query = SearchQuery {
            min_price: Some(5000.0),
            max_price: Some(50000.0),
            sort_by: SortBy::Price,
            ..query("lavado premium")
        };
        let mut rng = StdRng::seed_from_u64(3);
        let response =
            search_listings(&repo, query, &SearchSettings::default(), &mut rng).expect("ok");

        assert_eq!(response.total, 45);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.results.len(), 20);
        let range = &response.statistics.price_range;
        assert!(range.min <= range.average && range.average <= range.max);
    }

    #[test]
    fn relevance_results_are_diversified() {
        let mut repo = MockRepository::new();
        repo.expect_count_listings().returning(|_| Ok(6));
        repo.expect_find_listings().returning(|_| {
            Ok(vec![
                candidate(1, 1.0, "Santiago", "Metropolitana"),
                candidate(2, 1.0, "Santiago", "Metropolitana"),
                candidate(3, 1.0, "Santiago", "Metropolitana"),
                candidate(4, 1.0, "Viña del Mar", "Valparaíso"),
                candidate(5, 1.0, "Concepción", "Biobío"),
                candidate(6, 1.0, "Temuco", "Araucanía"),
            ])
        });
        repo.expect_list_price_points().returning(|_| Ok(Vec::new()));
        repo.expect_list_matching_categories().returning(|_, _| Ok(Vec::new()));

        let mut rng = StdRng::seed_from_u64(11);
        let response = search_listings(&repo, query("lavado"), &SearchSettings::default(), &mut rng)
            .expect("ok");

        let leading: HashSet<String> = response.results[..4]
            .iter()
            .filter_map(|item| item.provider.as_ref().map(|p| p.region.clone()))
            .collect();
        assert_eq!(leading.len(), 4);
        let mut all = ids(&response.results);
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn failed_statistics_do_not_fail_the_search() {
        let mut repo = MockRepository::new();
        repo.expect_count_listings().returning(|_| Ok(1));
        repo.expect_find_listings()
            .returning(|_| Ok(vec![candidate(1, 1.0, "Santiago", "Metropolitana")]));
        repo.expect_list_price_points()
            .returning(|_| Err(RepositoryError::ConnectionError("pool closed".into())));
        repo.expect_list_matching_categories()
            .returning(|_, _| Err(RepositoryError::DatabaseError("locked".into())));

        let mut rng = StdRng::seed_from_u64(0);
        let response = search_listings(&repo, query("lavado"), &SearchSettings::default(), &mut rng)
            .expect("results survive");

        assert_eq!(ids(&response.results), vec![1]);
        assert_eq!(response.statistics, SearchStatistics::default());
        assert!(response.suggestions.is_empty());
    }

    #[test]
    fn retrieval_failure_is_surfaced() {
        let mut repo = MockRepository::new();
        repo.expect_count_listings()
            .returning(|_| Err(RepositoryError::ConnectionError("down".into())));

        let mut rng = StdRng::seed_from_u64(0);
        let result = search_listings(&repo, query("lavado"), &SearchSettings::default(), &mut rng);
        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }

    #[test]
    fn invalid_query_is_rejected_before_retrieval() {
        let repo = MockRepository::new();
        let invalid = SearchQuery {
            limit: 0,
            min_rating: Some(7.0),
            ..query("lavado")
        };
        let mut rng = StdRng::seed_from_u64(0);
        match search_listings(&repo, invalid, &SearchSettings::default(), &mut rng) {
            Err(ServiceError::Validation(fields)) => assert_eq!(fields, vec!["limit", "minRating"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn discounted_orders_by_percent() {
        let mut repo = MockRepository::new();
        repo.expect_find_listings().returning(|_| {
            let mut small = candidate(1, 10000.0, "Santiago", "Metropolitana");
            small.listing.discounted_price = Some(9000.0);
            let mut large = candidate(2, 10000.0, "Santiago", "Metropolitana");
            large.listing.discounted_price = Some(5000.0);
            Ok(vec![small, large])
        });

        let result = discounted(&repo, &LimitForm::default(), &SearchSettings::default())
            .expect("ok");
        assert_eq!(ids(&result), vec![2, 1]);
        assert_eq!(result[0].discount.as_ref().map(|d| d.percent), Some(50));
    }

    #[test]
    fn similar_with_missing_reference_is_empty() {
        let mut repo = MockRepository::new();
        repo.expect_get_listing_by_id().returning(|_| Ok(None));

        let mut rng = StdRng::seed_from_u64(0);
        let result = similar_listings(&repo, 99, 6, &mut rng).expect("ok");
        assert!(result.is_empty());
    }

    #[test]
    fn similar_respects_limit_and_fetch_cap() {
        let mut repo = MockRepository::new();
        repo.expect_get_listing_by_id()
            .returning(|_| Ok(Some(located(1, 0.0))));
        repo.expect_list_similar_candidates()
            .withf(|_, cap| *cap == 6)
            .returning(|_, _| Ok((2..8).map(|id| located(id, f64::from(id))).collect()));

        let mut rng = StdRng::seed_from_u64(5);
        let result = similar_listings(&repo, 1, 2, &mut rng).expect("ok");
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|item| item.id != 1 && item.distance_km.is_some()));
    }

    #[test]
    fn similar_rejects_non_positive_ids() {
        let repo = MockRepository::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            similar_listings(&repo, 0, 6, &mut rng),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn interleave_alternates_groups() {
        let make = |text: &str, kind| Suggestion {
            text: text.into(),
            kind,
            id: None,
            metadata: json!({}),
        };
        let merged = interleave(
            vec![
                vec![
                    make("a", SuggestionKind::Service),
                    make("b", SuggestionKind::Service),
                ],
                vec![make("c", SuggestionKind::Category)],
            ],
            2,
        );
        let texts: Vec<&str> = merged.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }
}
