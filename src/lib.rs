#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod geom;
pub mod rfem;
pub mod value;

use std::fmt;

use components::extrude_members::{ExtrudeMode, solve_members};
use components::{ComponentError, ExtrudeMenu, ExtrudeSettings, MenuSlider};
use geom::{Curve3, CurveGeometry, GeomMesh, NurbsSurface, Plane};
use rfem::external::{
    ExternalCrossSection, ExternalLine, ExternalMember, ExternalNode, ExternalOpening, ExternalSurface,
    cross_section_from_external, line_from_external, member_from_external, node_from_external,
    opening_from_external, surface_from_external,
};
use rfem::{RfCroSec, RfObject};
use serde::Serialize;
use value::{SurfaceValue, TargetShape, Value};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Aantal bemonsterde punten per span bij het exporteren van gebogen curves.
const CURVE_SAMPLES_PER_SPAN: usize = 8;

#[derive(Debug, Serialize)]
struct SliderExport {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<f64>,
    value: f64,
}

impl From<&MenuSlider> for SliderExport {
    fn from(slider: &MenuSlider) -> Self {
        Self {
            id: slider.id.to_owned(),
            name: slider.name.to_owned(),
            min: Some(slider.min),
            max: Some(slider.max),
            step: Some(slider.step()),
            value: slider.value(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
enum GeometryItem {
    Point {
        coordinates: [f64; 3],
    },
    Line {
        start: [f64; 3],
        end: [f64; 3],
    },
    Polyline {
        points: Vec<[f64; 3]>,
    },
    Plane {
        origin: [f64; 3],
        x_axis: [f64; 3],
        y_axis: [f64; 3],
    },
    Mesh {
        vertices: Vec<[f64; 3]>,
        faces: Vec<[u32; 3]>,
    },
    NurbsSurface {
        degree_u: usize,
        degree_v: usize,
        u_count: usize,
        v_count: usize,
        control_points: Vec<[f64; 3]>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },
}

#[derive(Debug, Serialize, Clone, PartialEq)]
struct MessageExport {
    level: String,
    message: String,
}

impl From<&ComponentError> for MessageExport {
    fn from(error: &ComponentError) -> Self {
        Self {
            level: error.level().to_string(),
            message: error.message().to_owned(),
        }
    }
}

/// Resultaat van één staaf: geometrie of een melding, nooit beide.
#[derive(Debug, Serialize, Clone, PartialEq)]
struct ExtrudeResponse {
    member_no: i32,
    items: Vec<GeometryItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<MessageExport>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
struct ConvertResponse {
    label: String,
    shape: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    integer: Option<i64>,
    items: Vec<GeometryItem>,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    menu: ExtrudeMenu,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            menu: ExtrudeMenu::default(),
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Haal de menu-sliders op voor UI-generatie.
    #[wasm_bindgen]
    pub fn get_settings(&self) -> Result<JsValue, JsValue> {
        let sliders: Vec<SliderExport> = self.menu.sliders().into_iter().map(SliderExport::from).collect();
        serde_wasm_bindgen::to_value(&sliders).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Stel een slider in op basis van id of naam; retourneert de begrensde
    /// waarde die daadwerkelijk is ingesteld.
    #[wasm_bindgen]
    pub fn set_setting(&mut self, id_or_name: &str, value: f64) -> Result<f64, JsValue> {
        if id_or_name.trim().is_empty() {
            return Err(js_error("onbekende sliderreferentie"));
        }
        self.menu.set(id_or_name, value).map_err(to_js_error)
    }

    /// Zet beide sliders terug op hun standaardwaarde.
    #[wasm_bindgen]
    pub fn reset_settings(&mut self) {
        self.menu.segment_length.reset();
        self.menu.faces_per_cross_section.reset();
    }

    /// Extrudeer één staaf met de huidige menu-instellingen.
    ///
    /// `member` is een `ExternalMember`, `cross_sections` een lijst
    /// `ExternalCrossSection`; `mode` is `"mesh"` of `"surface"`.
    #[wasm_bindgen]
    pub fn extrude_member(&self, member: JsValue, cross_sections: JsValue, mode: &str) -> Result<JsValue, JsValue> {
        let member: ExternalMember = serde_wasm_bindgen::from_value(member).map_err(to_js_error)?;
        let sections: Vec<ExternalCrossSection> =
            serde_wasm_bindgen::from_value(cross_sections).map_err(to_js_error)?;
        let mode = parse_mode(mode).map_err(|err| js_error(&err))?;

        let responses = extrude_records(std::slice::from_ref(&member), &sections, &self.menu.settings(), mode)
            .map_err(|err| js_error(&err))?;
        let Some(response) = responses.into_iter().next() else {
            return Err(js_error("extrusie leverde geen resultaat"));
        };
        serde_wasm_bindgen::to_value(&response).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Extrudeer een lijst staven; het resultaat volgt de invoervolgorde.
    #[wasm_bindgen]
    pub fn extrude_members(&self, members: JsValue, cross_sections: JsValue, mode: &str) -> Result<JsValue, JsValue> {
        let members: Vec<ExternalMember> = serde_wasm_bindgen::from_value(members).map_err(to_js_error)?;
        let sections: Vec<ExternalCrossSection> =
            serde_wasm_bindgen::from_value(cross_sections).map_err(to_js_error)?;
        let mode = parse_mode(mode).map_err(|err| js_error(&err))?;

        let responses =
            extrude_records(&members, &sections, &self.menu.settings(), mode).map_err(|err| js_error(&err))?;
        serde_wasm_bindgen::to_value(&responses).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Zet een RFEM-record om naar de gevraagde vorm (`Mesh`, `Surface`,
    /// `Curve`, `Point`, `Plane` of `Integer`).
    #[wasm_bindgen]
    pub fn convert(&self, kind: &str, record: JsValue, shape: &str) -> Result<JsValue, JsValue> {
        let Some(shape) = TargetShape::from_name(shape) else {
            return Err(js_error(&format!("onbekende doelvorm `{shape}`")));
        };
        let object = object_from_record(kind, record)?;
        let response = convert_object(&object, shape).map_err(|err| js_error(&err))?;
        serde_wasm_bindgen::to_value(&response).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

fn parse_mode(mode: &str) -> Result<ExtrudeMode, String> {
    ExtrudeMode::from_name(mode).ok_or_else(|| format!("onbekende extrusiemodus `{mode}`"))
}

fn object_from_record(kind: &str, record: JsValue) -> Result<RfObject, JsValue> {
    let object = match normalize_name(kind).as_str() {
        "node" => {
            let node: ExternalNode = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::Node(node_from_external(&node))
        }
        "line" => {
            let line: ExternalLine = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::Line(line_from_external(&line).map_err(to_js_error)?)
        }
        "member" => {
            let member: ExternalMember = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::Member(member_from_external(&member).map_err(to_js_error)?)
        }
        "crosssection" | "cross section" => {
            let section: ExternalCrossSection = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::CrossSection(cross_section_from_external(&section).map_err(to_js_error)?)
        }
        "surface" => {
            let surface: ExternalSurface = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::Surface(surface_from_external(&surface).map_err(to_js_error)?)
        }
        "opening" => {
            let opening: ExternalOpening = serde_wasm_bindgen::from_value(record).map_err(to_js_error)?;
            RfObject::Opening(opening_from_external(&opening).map_err(to_js_error)?)
        }
        _ => return Err(js_error(&format!("onbekend RFEM-type `{kind}`"))),
    };
    Ok(object)
}

/// Extrudeert externe records. Een ongeldige doorsnede breekt de hele
/// aanvraag af; een ongeldige staaf levert alleen voor die staaf een melding.
fn extrude_records(
    members: &[ExternalMember],
    sections: &[ExternalCrossSection],
    settings: &ExtrudeSettings,
    mode: ExtrudeMode,
) -> Result<Vec<ExtrudeResponse>, String> {
    let sections = sections
        .iter()
        .map(cross_section_from_external)
        .collect::<Result<Vec<RfCroSec>, _>>()
        .map_err(|err| err.to_string())?;

    let mut responses: Vec<Option<ExtrudeResponse>> = vec![None; members.len()];
    let mut valid = Vec::with_capacity(members.len());
    let mut valid_slots = Vec::with_capacity(members.len());
    for (slot, record) in members.iter().enumerate() {
        match member_from_external(record) {
            Ok(member) => {
                valid.push(member);
                valid_slots.push(slot);
            }
            Err(err) => {
                responses[slot] = Some(failed_response(record.no, &ComponentError::warning(err.to_string())));
            }
        }
    }

    let results = solve_members(&valid, &sections, settings, mode);
    for ((slot, member), result) in valid_slots.into_iter().zip(&valid).zip(results) {
        responses[slot] = Some(match result {
            Ok(values) => {
                let mut items = Vec::new();
                for value in &values {
                    append_geometry_value(value, &mut items);
                }
                ExtrudeResponse {
                    member_no: member.no,
                    items,
                    message: None,
                }
            }
            Err(err) => failed_response(member.no, &err),
        });
    }

    Ok(responses.into_iter().flatten().collect())
}

fn failed_response(member_no: i32, error: &ComponentError) -> ExtrudeResponse {
    debug_log!("member {member_no}: {error}");
    ExtrudeResponse {
        member_no,
        items: Vec::new(),
        message: Some(MessageExport::from(error)),
    }
}

fn convert_object(object: &RfObject, shape: TargetShape) -> Result<ConvertResponse, String> {
    let value = rfem::convert(object, shape).map_err(|err| err.to_string())?;
    let integer = match &value {
        Value::Integer(no) => Some(*no),
        _ => None,
    };
    let mut items = Vec::new();
    append_geometry_value(&value, &mut items);

    Ok(ConvertResponse {
        label: object.to_string(),
        shape: shape.name(),
        integer,
        items,
    })
}

fn append_geometry_value(value: &Value, items: &mut Vec<GeometryItem>) {
    match value {
        Value::Point(point) => items.push(GeometryItem::Point {
            coordinates: point.to_array(),
        }),
        Value::Plane(plane) => items.push(plane_item(plane)),
        Value::Curve(curve) => items.push(curve_item(curve)),
        Value::Mesh(mesh) => items.push(mesh_item(mesh)),
        Value::Surface(SurfaceValue::Nurbs(surface)) => items.push(surface_item(surface)),
        Value::Surface(SurfaceValue::Boundary(curves)) => items.extend(curves.iter().map(curve_item)),
        Value::List(values) => {
            for entry in values {
                append_geometry_value(entry, items);
            }
        }
        Value::Integer(_) | Value::Number(_) | Value::Text(_) | Value::Rfem(_) => {}
    }
}

fn plane_item(plane: &Plane) -> GeometryItem {
    GeometryItem::Plane {
        origin: plane.origin.to_array(),
        x_axis: [plane.x_axis.x, plane.x_axis.y, plane.x_axis.z],
        y_axis: [plane.y_axis.x, plane.y_axis.y, plane.y_axis.z],
    }
}

#[allow(clippy::cast_precision_loss)]
fn curve_item(curve: &CurveGeometry) -> GeometryItem {
    match curve {
        CurveGeometry::Line(line) => GeometryItem::Line {
            start: line.start.to_array(),
            end: line.end.to_array(),
        },
        CurveGeometry::Polyline(polyline) => {
            let mut points: Vec<[f64; 3]> = polyline.points().iter().map(|p| p.to_array()).collect();
            if polyline.closed() {
                if let Some(first) = points.first().copied() {
                    points.push(first);
                }
            }
            GeometryItem::Polyline { points }
        }
        CurveGeometry::Arc(_) | CurveGeometry::Nurbs(_) => {
            let mut points = Vec::new();
            for (t0, t1) in curve.spans() {
                let skip = usize::from(!points.is_empty());
                for k in skip..=CURVE_SAMPLES_PER_SPAN {
                    let t = t0 + (t1 - t0) * k as f64 / CURVE_SAMPLES_PER_SPAN as f64;
                    points.push(curve.point_at(t).to_array());
                }
            }
            GeometryItem::Polyline { points }
        }
    }
}

fn mesh_item(mesh: &GeomMesh) -> GeometryItem {
    GeometryItem::Mesh {
        vertices: mesh.positions.clone(),
        faces: mesh.triangles(),
    }
}

fn surface_item(surface: &NurbsSurface) -> GeometryItem {
    GeometryItem::NurbsSurface {
        degree_u: surface.degree_u,
        degree_v: surface.degree_v,
        u_count: surface.u_count,
        v_count: surface.v_count,
        control_points: surface.control_points.iter().map(|p| p.to_array()).collect(),
        knots_u: surface.knots_u.clone(),
        knots_v: surface.knots_v.clone(),
        weights: surface.weights.clone(),
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
