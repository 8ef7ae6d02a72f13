// Writing the choropleth map as GeoJSON.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};

use crate::session::*;

const BORDER_COLOR: &str = "black";
const BORDER_WEIGHT: u32 = 1;
const FILL_OPACITY: f64 = 0.5;

/// One feature per region of the catalog, with its votes and fill color.
pub fn build_choropleth<D: ChoiceDomain>(
    catalog: &RegionCatalog,
    summary: &Summary,
    question: Option<&str>,
) -> GeoJson {
    let mut features: Vec<Feature> = Vec::new();
    for region in catalog.regions() {
        let rs = match summary.get(&region.id) {
            Some(rs) => rs,
            None => {
                warn!("build_choropleth: region {} missing from the summary", region.id);
                continue;
            }
        };
        let class = D::classify(rs);
        let fill_color = D::fill_color(class);

        let mut counts: JsonObject = JsonObject::new();
        for (label, count) in rs.counts.iter() {
            counts.insert(label.clone(), json!(count));
        }
        let mut properties: JsonObject = JsonObject::new();
        properties.insert("id".to_string(), json!(region.id.as_str()));
        properties.insert("name".to_string(), json!(region.name));
        properties.insert("counts".to_string(), JSValue::Object(counts));
        properties.insert("total".to_string(), json!(rs.total));
        if let Some(average) = rs.average {
            properties.insert("average".to_string(), json!(average));
        }
        properties.insert("colorClass".to_string(), json!(class.as_str()));
        properties.insert("fillColor".to_string(), json!(fill_color));
        properties.insert(
            "style".to_string(),
            json!({
                "fillColor": fill_color,
                "color": BORDER_COLOR,
                "weight": BORDER_WEIGHT,
                "fillOpacity": FILL_OPACITY,
            }),
        );

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&region.geometry))),
            id: Some(Id::String(region.id.to_string())),
            properties: Some(properties),
            foreign_members: None,
        });
    }
    debug!("build_choropleth: {} features", features.len());

    let foreign_members = question.map(|q| {
        let mut fm = JsonObject::new();
        fm.insert("question".to_string(), json!(q));
        fm.insert("domain".to_string(), json!(D::name()));
        fm
    });
    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    })
}

/// Writes the map to a file, or to the standard output with `stdout`.
pub fn write_geojson(gj: &GeoJson, target: &str) -> SessionResult<()> {
    let contents = serde_json::to_string(gj).context(WritingJsonSnafu {})?;
    if target == "stdout" {
        println!("{}", contents);
    } else {
        fs::write(target, contents).context(WritingOutputSnafu { path: target })?;
    }
    Ok(())
}
