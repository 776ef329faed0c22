// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end render passes over small chart-like trees.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Insets, Point, Rect, Size, Vec2};
use lamina_core::annotation::{Annotation, AnnotationAnchor, RectAnchor};
use lamina_core::border::BorderPath;
use lamina_core::color::Rgba;
use lamina_core::context::{Canvas, ContextRef, ContextStack, context_ref};
use lamina_core::geometry::Padding;
use lamina_core::layer::{LayerContent, LayerDrawCx, LayerId, LayerStore, SolidFill};
use lamina_core::legend::{LegendEntry, Plot, PlotKey};
use lamina_core::shadow::Shadow;
use lamina_core::text::TextStyle;
use lamina_render::{RasterCanvas, RenderError, RenderItem, RenderPlan, Renderer, RendererConfig};

/// A plot area with a rounded, masked border, a shadow, and two series.
fn chart(store: &mut LayerStore) -> LayerId {
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 60.0, 40.0));
    store.set_content(root, Some(Rc::new(SolidFill(Rgba::WHITE))));

    let area = store.create_layer_with_frame(Rect::new(10.0, 5.0, 50.0, 35.0));
    store.set_outer_border_path(
        area,
        Some(BorderPath::rounded_rect(Rect::new(0.0, 0.0, 40.0, 30.0), 3.0)),
    );
    store.set_masks_to_border(area, true);
    store.set_padding(area, Padding::uniform(2.0));
    store.set_shadow(area, Some(Shadow::new(Vec2::new(1.0, 1.0), 2.0, Rgba::BLACK.with_alpha(0.4))));
    store.set_content(area, Some(Rc::new(SolidFill(Rgba::new(0.9, 0.9, 0.9, 1.0)))));
    let mut flags = store.flags(area);
    flags.manual_layout = true;
    store.set_flags(area, flags);
    store.add_child(root, area);

    for color in [Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(0.0, 0.0, 1.0, 0.5)] {
        let series = store.create_layer();
        store.set_content(series, Some(Rc::new(SolidFill(color))));
        store.add_child(area, series);
    }
    root
}

fn approx_rect(a: Rect, b: Rect) -> bool {
    [a.x0 - b.x0, a.y0 - b.y0, a.x1 - b.x1, a.y1 - b.y1]
        .iter()
        .all(|d| d.abs() < 1e-9)
}

fn plan_context(size: Size) -> (Rc<RefCell<RenderPlan>>, ContextRef) {
    let plan = Rc::new(RefCell::new(RenderPlan::new(size)));
    let context: ContextRef = plan.clone();
    (plan, context)
}

#[test]
fn raster_and_vector_issue_the_same_commands() {
    let mut store = LayerStore::new();
    let root = chart(&mut store);
    store.layout_subtree(root, false);
    let size = store.bounds(root).size();
    let mut renderer = Renderer::new(RendererConfig::screen());

    let (vector, context) = plan_context(size);
    renderer.render_as_vector_in_context(&store, root, context).unwrap();
    let (raster, context) = plan_context(size);
    renderer.recursively_render_in_context(&store, root, context).unwrap();

    let vector = vector.borrow();
    assert!(!vector.items.is_empty());
    assert_eq!(*vector, *raster.borrow(), "command streams must match");
    assert_eq!(renderer.pass_count(), 2);
}

#[test]
fn sublayers_are_clipped_to_the_shadow_inset_border() {
    let mut store = LayerStore::new();
    let root = chart(&mut store);
    let area = store.children(root).next().unwrap();
    store.layout_subtree(root, false);

    // The shadow reserves ceil(1 + 2) = 3 on every side.
    let margin = store.sublayer_margin(area);
    assert_eq!(margin, Insets::uniform(5.0));
    let series = store.children(area).next().unwrap();
    assert_eq!(store.frame(series), Rect::new(5.0, 5.0, 35.0, 25.0));

    let (plan, context) = plan_context(Size::new(60.0, 40.0));
    Renderer::new(RendererConfig::screen())
        .recursively_render_in_context(&store, root, context)
        .unwrap();
    let clips: Vec<Rect> = plan
        .borrow()
        .clips()
        .map(kurbo::Shape::bounding_box)
        .collect();
    let expected = [Rect::new(0.0, 0.0, 40.0, 30.0), Rect::new(3.0, 3.0, 37.0, 27.0)];
    assert_eq!(clips.len(), 2, "own mask, then the sublayer mask: {clips:?}");
    for (clip, want) in clips.iter().zip(expected) {
        assert!(approx_rect(*clip, want), "{clip:?} != {want:?}");
    }
}

#[test]
fn layout_and_render_paints_pixels() {
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 40.0, 40.0));
    store.set_padding(root, Padding::uniform(10.0));
    let child = store.create_layer();
    store.set_content(child, Some(Rc::new(SolidFill(Rgba::BLACK))));
    store.add_child(root, child);

    let canvas = Rc::new(RefCell::new(RasterCanvas::new(Size::new(40.0, 40.0), 1.0).unwrap()));
    let context: ContextRef = canvas.clone();
    Renderer::new(RendererConfig::screen())
        .layout_and_render_in_context(&mut store, root, context)
        .unwrap();

    assert_eq!(store.frame(child), Rect::new(10.0, 10.0, 30.0, 30.0));
    let canvas = canvas.borrow();
    assert_eq!(canvas.pixel(20, 20), Some(Rgba::BLACK));
    assert_eq!(canvas.pixel(5, 5), Some(Rgba::TRANSPARENT));
    assert_eq!(canvas.pixel(35, 35), Some(Rgba::TRANSPARENT));
}

#[test]
fn masks_clip_raster_output() {
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 40.0, 40.0));
    store.set_outer_border_path(root, Some(BorderPath::Rect(Rect::new(0.0, 0.0, 20.0, 20.0))));
    store.set_masks_to_border(root, true);
    let child = store.create_layer_with_frame(Rect::new(10.0, 10.0, 40.0, 40.0));
    store.set_content(child, Some(Rc::new(SolidFill(Rgba::BLACK))));
    store.add_child(root, child);

    let canvas = Rc::new(RefCell::new(RasterCanvas::new(Size::new(40.0, 40.0), 1.0).unwrap()));
    let context: ContextRef = canvas.clone();
    Renderer::new(RendererConfig::screen())
        .recursively_render_in_context(&store, root, context)
        .unwrap();

    let canvas = canvas.borrow();
    assert_eq!(canvas.pixel(15, 15), Some(Rgba::BLACK));
    assert_eq!(canvas.pixel(30, 30), Some(Rgba::TRANSPARENT), "outside the sublayer mask");
}

#[test]
fn shadow_halo_reaches_past_the_layer() {
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 40.0, 40.0));
    let card = store.create_layer_with_frame(Rect::new(10.0, 10.0, 20.0, 20.0));
    store.set_shadow(card, Some(Shadow::new(Vec2::new(3.0, 3.0), 2.0, Rgba::BLACK)));
    store.set_content(card, Some(Rc::new(SolidFill(Rgba::WHITE))));
    store.add_child(root, card);

    let canvas = Rc::new(RefCell::new(RasterCanvas::new(Size::new(40.0, 40.0), 1.0).unwrap()));
    let context: ContextRef = canvas.clone();
    Renderer::new(RendererConfig::screen())
        .recursively_render_in_context(&store, root, context)
        .unwrap();

    let canvas = canvas.borrow();
    assert_eq!(canvas.pixel(15, 15), Some(Rgba::WHITE), "content covers its own shadow");
    let halo = canvas.pixel(22, 22).unwrap();
    assert!(halo.alpha > 0.0, "halo extends beyond the card: {halo:?}");
    assert_eq!(canvas.pixel(35, 35), Some(Rgba::TRANSPARENT));
}

#[test]
fn pdf_output_is_byte_identical() {
    let render = || {
        let mut store = LayerStore::new();
        let root = chart(&mut store);
        Renderer::new(RendererConfig::print())
            .data_for_pdf_representation_of_layer(&mut store, root)
            .unwrap()
    };
    let first = render();
    assert!(first.starts_with(b"%PDF-"));
    assert_eq!(first, render());
}

#[test]
fn empty_layer_has_no_pdf() {
    let mut store = LayerStore::new();
    let root = store.create_layer();
    let err = Renderer::new(RendererConfig::print())
        .data_for_pdf_representation_of_layer(&mut store, root)
        .unwrap_err();
    assert_eq!(err, RenderError::ZeroSizeContext { width: 0.0, height: 0.0 });
}

#[test]
fn annotation_content_renders_at_its_host_anchor() {
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 100.0, 50.0));
    let label = store.create_layer_with_frame(Rect::new(0.0, 0.0, 10.0, 10.0));
    store.set_content(label, Some(Rc::new(SolidFill(Rgba::BLACK))));
    store.add_annotation(
        root,
        Annotation::new(AnnotationAnchor::HostRect(RectAnchor::BottomRight))
            .with_content_layer(label)
            .with_content_anchor_point(Point::new(1.0, 1.0)),
    );
    assert_eq!(store.frame(label), Rect::new(90.0, 40.0, 100.0, 50.0));

    let (plan, context) = plan_context(Size::new(100.0, 50.0));
    Renderer::new(RendererConfig::screen())
        .layout_and_render_in_context(&mut store, root, context)
        .unwrap();
    assert_eq!(store.frame(label), Rect::new(90.0, 40.0, 100.0, 50.0), "layout leaves it alone");
    assert!(plan.borrow().items.contains(&RenderItem::Transform(store.layer_to_parent(label))));
}

struct Series;

impl Plot for Series {
    fn key(&self) -> PlotKey {
        PlotKey::from("series")
    }
    fn number_of_legend_entries(&self) -> usize {
        1
    }
    fn title_for_legend_entry(&self, index: usize) -> Option<String> {
        (index == 0).then(|| "Revenue".into())
    }
}

struct Legend(LegendEntry);

impl LayerContent for Legend {
    fn draw(&self, cx: &LayerDrawCx, canvas: &mut dyn Canvas) {
        self.0.draw_title_in_rect(cx.content_bounds, canvas, cx.contents_scale);
    }
}

#[test]
fn legend_titles_render_in_both_modes() {
    let plot: Rc<dyn Plot> = Rc::new(Series);
    let entry = LegendEntry::new(&plot, 0, TextStyle::new(10.0, Rgba::BLACK));
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 80.0, 20.0));
    store.set_content(root, Some(Rc::new(Legend(entry))));

    let (plan, context) = plan_context(Size::new(80.0, 20.0));
    let mut renderer = Renderer::new(RendererConfig::screen());
    renderer.recursively_render_in_context(&store, root, context).unwrap();
    let texts: Vec<(String, Point)> = plan
        .borrow()
        .items
        .iter()
        .filter_map(|item| match item {
            RenderItem::Text { text, origin, .. } => Some((text.clone(), *origin)),
            _ => None,
        })
        .collect();
    // 12pt line box centered in 20: offset 4.
    assert_eq!(texts, vec![("Revenue".to_string(), Point::new(0.0, 4.0))]);

    let pdf = renderer.data_for_pdf_representation_of_layer(&mut store, root).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    // The raster backend accepts the same pass.
    let raster = context_ref(RasterCanvas::new(Size::new(80.0, 20.0), 2.0).unwrap());
    renderer.recursively_render_in_context(&store, root, raster).unwrap();
}

/// Draws its content bounds through whatever context is current.
struct CurrentContextFill(Rc<ContextStack>);

impl LayerContent for CurrentContextFill {
    fn draw(&self, cx: &LayerDrawCx, _canvas: &mut dyn Canvas) {
        let path = kurbo::Shape::to_path(&cx.content_bounds, 0.1);
        self.0.current().borrow_mut().fill_path(&path, Rgba::BLACK);
    }
}

#[test]
fn content_drawing_through_the_current_context_is_transformed_and_clipped() {
    let mut renderer = Renderer::new(RendererConfig::screen());
    let mut store = LayerStore::new();
    let root = store.create_layer_with_frame(Rect::new(0.0, 0.0, 40.0, 40.0));
    store.set_outer_border_path(root, Some(BorderPath::Rect(Rect::new(0.0, 0.0, 25.0, 25.0))));
    store.set_masks_to_border(root, true);
    let child = store.create_layer_with_frame(Rect::new(10.0, 10.0, 30.0, 30.0));
    store.set_content(child, Some(Rc::new(CurrentContextFill(renderer.context_stack()))));
    store.add_child(root, child);

    let canvas = Rc::new(RefCell::new(RasterCanvas::new(Size::new(40.0, 40.0), 1.0).unwrap()));
    let context: ContextRef = canvas.clone();
    renderer.recursively_render_in_context(&store, root, context).unwrap();

    let canvas = canvas.borrow();
    assert_eq!(canvas.pixel(15, 15), Some(Rgba::BLACK), "drawn in the child's space");
    assert_eq!(canvas.pixel(5, 5), Some(Rgba::TRANSPARENT));
    assert_eq!(canvas.pixel(28, 28), Some(Rgba::TRANSPARENT), "clipped by the parent's mask");
    assert!(renderer.context_stack().is_empty());
}
