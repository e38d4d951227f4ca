use std::collections::HashMap;

use anyhow::bail;

const SEGMENT_POINTS: i32 = 4;
const STATIC_POINTS: i32 = 3;
const DYNAMIC_POINTS: i32 = 2;
const SPLAT_PENALTY: i32 = 1;
const ROOT_POINTS: i32 = 1;

const RESERVED_PARAMS: [&str; 2] = ["uri", "path"];

#[derive(Debug, Clone, PartialEq)]
pub struct Route<T> {
    pub path: String,
    pub value: T,
}

impl<T> Route<T> {
    pub fn new(path: &str, value: T) -> Route<T> {
        Route { path: path.to_string(), value }
    }
}

#[derive(Debug, PartialEq)]
pub struct Match<'a, T> {
    pub route: &'a Route<T>,
    pub params: HashMap<String, String>,
    /// The part of the uri matched by the route.
    pub uri: String,
}

fn segmentize(uri: &str) -> Vec<&str> {
    uri.trim_start_matches('/').trim_end_matches('/').split('/').collect()
}

fn is_splat(segment: &str) -> bool {
    segment.starts_with('*')
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|e| e.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

pub fn rank_route(path: &str) -> i32 {
    segmentize(path).iter().fold(0, |score, segment| {
        let score = score + SEGMENT_POINTS;
        if segment.is_empty() {
            score + ROOT_POINTS
        } else if segment.starts_with(':') {
            score + DYNAMIC_POINTS
        } else if is_splat(segment) {
            score - SEGMENT_POINTS - SPLAT_PENALTY
        } else {
            score + STATIC_POINTS
        }
    })
}

/// Routes ordered by score, equal scores keep their declared order.
pub fn rank_routes<T>(routes: &[Route<T>]) -> Vec<&Route<T>> {
    let mut ranked: Vec<(i32, usize, &Route<T>)> = routes.iter()
        .enumerate()
        .map(|(i, route)| (rank_route(&route.path), i, route))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, _, route)| route).collect()
}

fn match_route<'a, T>(route: &'a Route<T>, uri: &str) -> anyhow::Result<Option<Match<'a, T>>> {
    let uri_segments = segmentize(uri);
    let route_segments = segmentize(&route.path);
    let is_root_uri = uri == "/";
    let mut params = HashMap::new();

    let max = uri_segments.len().max(route_segments.len());
    let mut index = 0;
    while index < max {
        let route_segment = route_segments.get(index);
        let uri_segment = uri_segments.get(index);

        if let Some(splat) = route_segment.filter(|e| is_splat(e)) {
            let name = match &splat[1..] {
                "" => "*",
                name => name,
            };
            let rest: Vec<String> = uri_segments[index.min(uri_segments.len())..].iter().map(|e| decode(e)).collect();
            params.insert(name.to_string(), rest.join("/"));
            break;
        }

        let Some(uri_segment) = uri_segment else { return Ok(None) };
        match route_segment {
            Some(segment) if segment.starts_with(':') && !is_root_uri => {
                let name = &segment[1..];
                if RESERVED_PARAMS.contains(&name) {
                    bail!("<Route path=\"{}\"> dynamic segment \"{name}\" is a reserved name", route.path);
                }
                params.insert(name.to_string(), decode(uri_segment));
            },
            Some(segment) if segment == uri_segment => {},
            _ => return Ok(None),
        }
        index += 1;
    }

    Ok(Some(Match {
        route,
        params,
        uri: format!("/{}", uri_segments[..index.min(uri_segments.len())].join("/")),
    }))
}

/// Best matching route for the uri with its decoded params.
pub fn pick<'a, T>(routes: &'a [Route<T>], uri: &str) -> anyhow::Result<Option<Match<'a, T>>> {
    for route in rank_routes(routes) {
        if let Some(m) = match_route(route, uri)? {
            return Ok(Some(m));
        }
    }
    Ok(None)
}
