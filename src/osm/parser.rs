use crate::api::OverpassResponse;
use crate::domain::WaterRing;
use std::collections::HashMap;

fn build_node_lookup(response: &OverpassResponse) -> HashMap<u64, (f64, f64)> {
    response
        .elements
        .iter()
        .filter(|e| e.type_ == "node")
        .filter_map(|e| {
            let lat = e.lat?;
            let lon = e.lon?;
            Some((e.id, (lon, lat)))
        })
        .collect()
}

fn resolve_way_to_points(node_refs: &[u64], nodes: &HashMap<u64, (f64, f64)>) -> Vec<(f64, f64)> {
    node_refs
        .iter()
        .filter_map(|id| nodes.get(id).copied())
        .collect()
}

fn is_closed_way(points: &[(f64, f64)]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let first = points.first().unwrap();
    let last = points.last().unwrap();
    (first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9
}

/// Parse Overpass water ways into closed rings.
///
/// # Algorithm
/// 1. Build node_id → (lon, lat) lookup map from all node elements
/// 2. For each way element:
///    - Resolve node refs to coordinates
///    - Keep only closed rings with at least 4 points (linear waterways such
///      as river centrelines come back open and are dropped here)
pub fn parse_water(response: &OverpassResponse) -> Vec<WaterRing> {
    let nodes = build_node_lookup(response);
    let mut rings = Vec::new();

    for element in &response.elements {
        if element.type_ != "way" {
            continue;
        }

        let node_refs = match &element.nodes {
            Some(n) => n,
            None => continue,
        };

        let points = resolve_way_to_points(node_refs, &nodes);

        if !is_closed_way(&points) {
            continue;
        }

        if points.len() < 4 {
            continue;
        }

        rings.push(WaterRing::new(points));
    }

    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::overpass::Element;

    fn node(id: u64, lat: f64, lon: f64) -> Element {
        Element {
            type_: "node".to_string(),
            id,
            lat: Some(lat),
            lon: Some(lon),
            nodes: None,
            tags: None,
        }
    }

    fn way(id: u64, nodes: Vec<u64>) -> Element {
        Element {
            type_: "way".to_string(),
            id,
            lat: None,
            lon: None,
            nodes: Some(nodes),
            tags: None,
        }
    }

    #[test]
    fn test_parse_water_closed_way() {
        let response = OverpassResponse {
            elements: vec![
                node(1, 31.0, 121.0),
                node(2, 31.0, 121.1),
                node(3, 31.1, 121.1),
                way(100, vec![1, 2, 3, 1]),
            ],
        };

        let rings = parse_water(&response);

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].points.len(), 4);
        // Lookup stores (lon, lat).
        assert_eq!(rings[0].points[0], (121.0, 31.0));
    }

    #[test]
    fn test_parse_water_skips_open_way() {
        let response = OverpassResponse {
            elements: vec![
                node(1, 31.0, 121.0),
                node(2, 31.0, 121.1),
                node(3, 31.1, 121.1),
                way(100, vec![1, 2, 3]),
            ],
        };

        assert!(parse_water(&response).is_empty());
    }

    #[test]
    fn test_parse_water_skips_missing_nodes() {
        // Node 9 is never defined; the way shrinks below the minimum and is
        // dropped instead of producing a distorted ring.
        let response = OverpassResponse {
            elements: vec![
                node(1, 31.0, 121.0),
                node(2, 31.0, 121.1),
                way(100, vec![1, 2, 9, 1]),
            ],
        };

        assert!(parse_water(&response).is_empty());
    }
}
