//! Document Builder Module
//!
//! Lays out a report model into a paginated PDF. Body content flows into a
//! fixed frame on each page; headers and footers are drawn afterwards by a
//! per-page decorator that only sees an immutable [`PageContext`].

use crate::error::ReportError;
use crate::layout::{Font, encode_win_ansi, wrap_text};
use crate::logo::{LOGO_MAX, LogoSpec};
use crate::report_model::{Color, ComplianceTable, FailureList, STATUS_COLUMN};
use log::{debug, info};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::fs;
use std::path::Path;

// US Letter in points (1/72 inch).
const LETTER_WIDTH_PT: f32 = 612.0;
const LETTER_HEIGHT_PT: f32 = 792.0;

const MARGIN: f32 = 72.0;
/// Footer baseline sits this far below the bottom margin.
const FOOTER_OFFSET: f32 = 18.0;
const FOOTER_FONT_SIZE: f32 = 10.0;

const HEADER_TITLE_SIZE: f32 = 24.0;
/// Height of the first-page header band when no logo is available.
const HEADER_BAND_FALLBACK: f32 = 72.0;
/// Share of the content width the header logo may take from the title.
const HEADER_LOGO_WIDTH_SHARE: f32 = 0.5;

// The table frame leaves 1.5in above the bottom margin and 1in below the top
// margin for the footer and the first-page header.
const TABLE_FRAME_BOTTOM_GAP: f32 = 108.0;
const TABLE_FRAME_TOP_GAP: f32 = 72.0;

const CELL_FONT_SIZE: f32 = 10.0;
const CELL_LEADING: f32 = 12.0;
const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_TOP: f32 = 3.0;
const CELL_PAD_BOTTOM: f32 = 3.0;
const HEADER_CELL_PAD_BOTTOM: f32 = 12.0;
const GRID_LINE_WIDTH: f32 = 1.0;

const BLOCK_GAP: f32 = 12.0;
const BLOCK_TRAILER: f32 = 72.0;

const LOGO_NAME: Name<'static> = Name(b"Logo");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const PORTRAIT: PageSize = PageSize {
        width: LETTER_WIDTH_PT,
        height: LETTER_HEIGHT_PT,
    };
    pub const LANDSCAPE: PageSize = PageSize {
        width: LETTER_HEIGHT_PT,
        height: LETTER_WIDTH_PT,
    };
}

/// Everything the page decorator may read. Built once per document.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub title: &'a str,
    pub footer_label: &'a str,
    /// Timestamp printed in the footer.
    pub generated_at: String,
    pub logo: Option<&'a LogoSpec>,
}

impl<'a> RenderContext<'a> {
    /// Captures the current local time for the footer.
    pub fn new(title: &'a str, footer_label: &'a str, logo: Option<&'a LogoSpec>) -> Self {
        RenderContext {
            title,
            footer_label,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            logo,
        }
    }

    pub fn footer_text(&self) -> String {
        format!("{} - Generated on: {}", self.footer_label, self.generated_at)
    }
}

/// What the decorator knows about the page it is drawing on.
pub struct PageContext<'c, 'a> {
    pub render: &'c RenderContext<'a>,
    /// 1-based, counted by the builder.
    pub number: usize,
    pub size: PageSize,
}

/// A finished PDF held in memory.
#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Drawing operations for one page.
struct Canvas {
    content: Content,
}

impl Canvas {
    fn new() -> Self {
        Canvas {
            content: Content::new(),
        }
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Color, text: &str) {
        let bytes = encode_win_ansi(text);
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.begin_text();
        self.content.set_font(font.resource_name(), size);
        self.content.next_line(x, y);
        self.content.show(Str(&bytes));
        self.content.end_text();
    }

    fn text_right(&mut self, right: f32, y: f32, font: Font, size: f32, text: &str) {
        let x = right - font.text_width(text, size);
        self.text(x, y, font, size, Color::BLACK, text);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.rect(x, y, w, h);
        self.content.fill_nonzero();
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.content.set_stroke_rgb(0.0, 0.0, 0.0);
        self.content.set_line_width(GRID_LINE_WIDTH);
        self.content.rect(x, y, w, h);
        self.content.stroke();
    }

    fn image(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.content.save_state();
        self.content.transform([w, 0.0, 0.0, h, x, y]);
        self.content.x_object(LOGO_NAME);
        self.content.restore_state();
    }
}

/// Collects pages, then decorates and serializes them.
struct DocumentWriter {
    size: PageSize,
    pages: Vec<Canvas>,
}

impl DocumentWriter {
    fn new(size: PageSize) -> Self {
        DocumentWriter {
            size,
            pages: Vec::new(),
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Canvas::new());
    }

    fn canvas(&mut self) -> &mut Canvas {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn finish<F>(mut self, ctx: &RenderContext, decorate: F) -> RenderedPdf
    where
        F: Fn(&mut Canvas, &PageContext),
    {
        if self.pages.is_empty() {
            self.new_page();
        }
        for (i, canvas) in self.pages.iter_mut().enumerate() {
            let page = PageContext {
                render: ctx,
                number: i + 1,
                size: self.size,
            };
            decorate(canvas, &page);
        }

        let page_count = self.pages.len();
        let mut pdf = Pdf::new();
        let mut alloc = Ref::new(1);

        // Define top-level document objects
        let catalog_ref = alloc.bump();
        let page_tree_ref = alloc.bump();
        let info_ref = alloc.bump();
        pdf.catalog(catalog_ref).pages(page_tree_ref);
        pdf.document_info(info_ref)
            .title(TextStr(ctx.title))
            .producer(TextStr(concat!("scanreport ", env!("CARGO_PKG_VERSION"))));

        let font_refs: Vec<(Font, Ref)> = Font::ALL.iter().map(|&f| (f, alloc.bump())).collect();
        for (font, font_ref) in &font_refs {
            pdf.type1_font(*font_ref)
                .base_font(font.base_font())
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        let logo_ref = ctx.logo.map(|logo| {
            let image_ref = alloc.bump();
            let mut image_xobject = pdf.image_xobject(image_ref, &logo.jpeg);
            image_xobject.filter(Filter::DctDecode);
            image_xobject.width(logo.pixel_width as i32);
            image_xobject.height(logo.pixel_height as i32);
            image_xobject.color_space().device_rgb();
            image_xobject.bits_per_component(8);
            image_xobject.finish();
            image_ref
        });

        // Pre-allocate all page Refs
        let page_refs: Vec<Ref> = (0..page_count).map(|_| alloc.bump()).collect();

        for (canvas, page_ref) in self.pages.into_iter().zip(page_refs.iter().copied()) {
            let content_ref = alloc.bump();
            let mut page = pdf.page(page_ref);
            page.media_box(Rect::new(0.0, 0.0, self.size.width, self.size.height));
            page.parent(page_tree_ref);
            page.contents(content_ref);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (font, font_ref) in &font_refs {
                fonts.pair(font.resource_name(), *font_ref);
            }
            fonts.finish();
            if let Some(image_ref) = logo_ref {
                resources.x_objects().pair(LOGO_NAME, image_ref);
            }
            resources.finish();
            page.finish();

            pdf.stream(content_ref, &canvas.content.finish());
        }

        pdf.pages(page_tree_ref).kids(page_refs).count(page_count as i32);

        RenderedPdf {
            bytes: pdf.finish(),
            page_count,
        }
    }
}

/// Footer drawn on every page: label and timestamp on the left, page number
/// on the right.
fn draw_footer(canvas: &mut Canvas, page: &PageContext) {
    let y = MARGIN - FOOTER_OFFSET;
    canvas.text(
        MARGIN,
        y,
        Font::Regular,
        FOOTER_FONT_SIZE,
        Color::BLACK,
        &page.render.footer_text(),
    );
    canvas.text_right(
        page.size.width - MARGIN,
        y,
        Font::Regular,
        FOOTER_FONT_SIZE,
        &format!("Page {}", page.number),
    );
}

/// Logo at the top left, title centered in the width that remains.
fn draw_table_header(canvas: &mut Canvas, page: &PageContext) {
    let ctx = page.render;
    let (logo_width, band) = match ctx.logo {
        Some(logo) => {
            let max_width = (page.size.width - 2.0 * MARGIN) * HEADER_LOGO_WIDTH_SHARE;
            let (width, height) = logo.fitted(max_width, LOGO_MAX);
            canvas.image(MARGIN, page.size.height - height, width, height);
            (width, height)
        }
        None => (0.0, HEADER_BAND_FALLBACK),
    };

    let title_width = Font::Bold.text_width(ctx.title, HEADER_TITLE_SIZE);
    let free = page.size.width - MARGIN - logo_width - title_width;
    let title_x = MARGIN + logo_width + free.max(0.0) / 2.0;
    let title_y = page.size.height - band / 2.0 - HEADER_TITLE_SIZE / 2.0;
    canvas.text(
        title_x,
        title_y,
        Font::Bold,
        HEADER_TITLE_SIZE,
        Color::BLACK,
        ctx.title,
    );
}

struct ParagraphStyle {
    font: Font,
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    color: Color,
}

const HEADING: ParagraphStyle = ParagraphStyle {
    font: Font::Bold,
    size: 18.0,
    leading: 22.0,
    space_before: 10.0,
    space_after: 6.0,
    color: Color::BLACK,
};

const BODY: ParagraphStyle = ParagraphStyle {
    font: Font::Regular,
    size: 10.0,
    leading: 12.0,
    space_before: 6.0,
    space_after: 0.0,
    color: Color::BLACK,
};

const REFERENCE: ParagraphStyle = ParagraphStyle {
    color: Color::BLUE,
    ..BODY
};

const RATIONALE: ParagraphStyle = ParagraphStyle {
    font: Font::Oblique,
    space_before: 0.0,
    ..BODY
};

enum Flowable<'a> {
    Paragraph(String, &'static ParagraphStyle),
    Spacer(f32),
    Logo(&'a LogoSpec),
}

/// Places flowables top to bottom, starting a new page whenever the next
/// line, spacer or image does not fit.
struct FlowFrame<'w> {
    writer: &'w mut DocumentWriter,
    left: f32,
    width: f32,
    top: f32,
    bottom: f32,
    y: f32,
    at_top: bool,
}

impl<'w> FlowFrame<'w> {
    fn new(writer: &'w mut DocumentWriter) -> Self {
        let size = writer.size;
        writer.new_page();
        FlowFrame {
            writer,
            left: MARGIN,
            width: size.width - 2.0 * MARGIN,
            top: size.height - MARGIN,
            bottom: MARGIN,
            y: size.height - MARGIN,
            at_top: true,
        }
    }

    fn break_page(&mut self) {
        self.writer.new_page();
        self.y = self.top;
        self.at_top = true;
    }

    fn place(&mut self, flowable: &Flowable) {
        match flowable {
            Flowable::Paragraph(text, style) => {
                let lines = wrap_text(text, style.font, style.size, self.width);
                if lines.is_empty() {
                    return;
                }
                if !self.at_top {
                    self.y -= style.space_before;
                }
                for line in &lines {
                    if self.y - style.leading < self.bottom {
                        self.break_page();
                    }
                    let baseline = self.y - style.size;
                    let left = self.left;
                    self.writer
                        .canvas()
                        .text(left, baseline, style.font, style.size, style.color, line);
                    self.y -= style.leading;
                    self.at_top = false;
                }
                self.y -= style.space_after;
            }
            Flowable::Spacer(height) => {
                // A spacer that would cross the frame edge just ends the page.
                if self.y - height < self.bottom {
                    self.break_page();
                } else {
                    self.y -= height;
                }
            }
            Flowable::Logo(logo) => {
                let (width, height) = logo.fitted(self.width, self.top - self.bottom);
                if self.y - height < self.bottom && !self.at_top {
                    self.break_page();
                }
                let x = self.left + (self.width - width).max(0.0) / 2.0;
                let y = self.y - height;
                self.writer.canvas().image(x, y, width, height);
                self.y = y;
                self.at_top = false;
            }
        }
    }
}

fn failure_list_flowables<'a>(model: &FailureList, ctx: &RenderContext<'a>) -> Vec<Flowable<'a>> {
    let mut flowables = vec![Flowable::Paragraph(ctx.title.to_string(), &HEADING)];
    if let Some(logo) = ctx.logo {
        flowables.push(Flowable::Logo(logo));
    }

    for row in &model.rows {
        flowables.push(Flowable::Paragraph(format!("Failed: {}", row.title), &HEADING));
        flowables.push(Flowable::Paragraph(
            format!("Description: {}", row.description),
            &BODY,
        ));
        flowables.push(Flowable::Paragraph(
            format!("Reference: {}", row.references),
            &REFERENCE,
        ));
        flowables.push(Flowable::Spacer(BLOCK_GAP));
        flowables.push(Flowable::Paragraph(
            format!("Rationale: {}", row.rationale),
            &RATIONALE,
        ));
        flowables.push(Flowable::Spacer(BLOCK_TRAILER));
    }

    if let Some(note) = model.overflow_note() {
        flowables.push(Flowable::Paragraph(note, &BODY));
    }
    flowables
}

/// Renders a failure list on portrait pages.
pub fn build_failure_list_pdf(model: &FailureList, ctx: &RenderContext) -> RenderedPdf {
    let mut writer = DocumentWriter::new(PageSize::PORTRAIT);
    {
        let mut frame = FlowFrame::new(&mut writer);
        for flowable in failure_list_flowables(model, ctx) {
            frame.place(&flowable);
        }
    }
    let rendered = writer.finish(ctx, |canvas, page| draw_footer(canvas, page));
    debug!(
        "Laid out {} findings on {} pages",
        model.rows.len(),
        rendered.page_count
    );
    rendered
}

/// One laid-out table row.
struct RowLayout {
    cells: Vec<Vec<String>>,
    height: f32,
}

struct TableFrame {
    left: f32,
    top: f32,
    bottom: f32,
    widths: [f32; 5],
}

impl TableFrame {
    fn new(size: PageSize) -> Self {
        let width = size.width - 2.0 * MARGIN;
        TableFrame {
            left: MARGIN,
            top: size.height - MARGIN - TABLE_FRAME_TOP_GAP,
            bottom: MARGIN + TABLE_FRAME_BOTTOM_GAP,
            widths: ComplianceTable::column_widths(width),
        }
    }

    fn layout_row<S: AsRef<str>>(
        &self,
        cells: &[S],
        font: Font,
        pad_bottom: f32,
        max_height: f32,
    ) -> RowLayout {
        let max_lines = (((max_height - CELL_PAD_TOP - pad_bottom) / CELL_LEADING).floor() as usize).max(1);
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(self.widths)
            .map(|(text, width)| {
                let mut lines = wrap_text(text.as_ref(), font, CELL_FONT_SIZE, width - 2.0 * CELL_PAD_X);
                if lines.len() > max_lines {
                    lines.truncate(max_lines);
                    if let Some(last) = lines.last_mut() {
                        *last = "...".to_string();
                    }
                }
                lines
            })
            .collect();
        let line_count = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        RowLayout {
            cells,
            height: line_count as f32 * CELL_LEADING + CELL_PAD_TOP + pad_bottom,
        }
    }

    /// Draws `row` with its top edge at `top`: fills, then text, then grid.
    fn draw_row(
        &self,
        canvas: &mut Canvas,
        row: &RowLayout,
        top: f32,
        font: Font,
        text_color: Color,
        fills: [Color; 5],
    ) {
        let bottom = top - row.height;
        let mut x = self.left;
        for (col, width) in self.widths.iter().enumerate() {
            canvas.fill_rect(x, bottom, *width, row.height, fills[col]);
            for (i, line) in row.cells[col].iter().enumerate() {
                let line_width = font.text_width(line, CELL_FONT_SIZE);
                let tx = x + (width - line_width) / 2.0;
                let baseline = top - CELL_PAD_TOP - CELL_FONT_SIZE - i as f32 * CELL_LEADING;
                canvas.text(tx, baseline, font, CELL_FONT_SIZE, text_color, line);
            }
            x += width;
        }
        let mut x = self.left;
        for width in self.widths {
            canvas.stroke_rect(x, bottom, width, row.height);
            x += width;
        }
    }
}

/// Renders a compliance table on landscape pages. The header row repeats on
/// every page; the logo and title header appear on the first page only.
pub fn build_compliance_table_pdf(model: &ComplianceTable, ctx: &RenderContext) -> RenderedPdf {
    let size = PageSize::LANDSCAPE;
    let frame = TableFrame::new(size);
    let frame_height = frame.top - frame.bottom;
    let mut writer = DocumentWriter::new(size);

    let header = frame.layout_row(&model.headers, Font::Bold, HEADER_CELL_PAD_BOTTOM, frame_height);
    let header_fills = [Color::GREY; 5];
    let body_height = frame_height - header.height;

    writer.new_page();
    frame.draw_row(writer.canvas(), &header, frame.top, Font::Bold, Color::WHITE_SMOKE, header_fills);
    let mut y = frame.top - header.height;

    for (index, row) in model.rows.iter().enumerate() {
        let layout = frame.layout_row(&row.cells, Font::Regular, CELL_PAD_BOTTOM, body_height);
        if y - layout.height < frame.bottom {
            writer.new_page();
            frame.draw_row(writer.canvas(), &header, frame.top, Font::Bold, Color::WHITE_SMOKE, header_fills);
            y = frame.top - header.height;
        }
        let mut fills = [ComplianceTable::row_fill(index); 5];
        fills[STATUS_COLUMN] = row.status_color;
        frame.draw_row(writer.canvas(), &layout, y, Font::Regular, Color::BLACK, fills);
        y -= layout.height;
    }

    let rendered = writer.finish(ctx, |canvas, page| {
        if page.number == 1 {
            draw_table_header(canvas, page);
        }
        draw_footer(canvas, page);
    });
    debug!(
        "Laid out {} table rows on {} pages",
        model.rows.len(),
        rendered.page_count
    );
    rendered
}

/// Writes a rendered document to `output_path`, creating its folder first.
pub fn write_pdf(rendered: &RenderedPdf, output_path: &Path) -> Result<(), ReportError> {
    // Ensure parent directory exists and write the file
    if let Some(parent_dir) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent_dir).map_err(|e| ReportError::output(parent_dir, e))?;
    }
    info!("Writing PDF to {:?}", output_path);
    fs::write(output_path, &rendered.bytes).map_err(|e| ReportError::output(output_path, e))
}
