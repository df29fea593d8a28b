use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use log::{info, warn};
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    add_component_to_list, create_bundle, create_list, delete_list, fetch_all_list_views,
    remove_bundle, remove_component_from_list, rename_list, update_component_overrides,
};
use crate::models::{self, Bundle, Component, ListView, NewBundle};
use crate::pricing::{format_total, total_price_with};
use crate::search::{DetailState, PartSummary, SearchCriteria, SearchSession};
use crate::settings::{Settings, CATEGORIES};

use super::forms::{
    BundleForm, ConfirmItemRemove, ConfirmListDelete, ListForm, OverridesForm, RemoveTarget,
};
use super::helpers::{centered_rect, field_line, step_index, surface_error, truncate};
use super::screens::{
    BundleScreen, CategoryPicker, ComponentPicker, ListDetailScreen, ListPicker, SearchScreen,
    SettingsRow, SettingsScreen,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows of the header panel above list contents.
const HEADER_HEIGHT: u16 = 4;

/// Top-level navigation states.
enum Screen {
    Lists,
    ListDetail(ListDetailScreen),
    Bundle(BundleScreen),
    Search(SearchScreen),
    Settings(SettingsScreen),
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    CreatingList(ListForm),
    RenamingList {
        id: i64,
        form: ListForm,
    },
    ConfirmListDelete(ConfirmListDelete),
    ConfirmItemRemove(ConfirmItemRemove),
    CreatingBundle(BundleForm),
    SelectingBundleComponents {
        bundle: NewBundle,
        picker: ComponentPicker,
    },
    EditingOverrides(OverridesForm),
    EditingQuery(String),
    SelectingCategory(CategoryPicker),
    SelectingList(ListPicker),
    ProductDetail(PartSummary),
    EditingName(String),
}

/// Owned copy of the highlighted row on the list detail screen.
enum Highlighted {
    Component(Component),
    Bundle(Bundle),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    settings: Settings,
    settings_path: Option<PathBuf>,
    lists: Vec<ListView>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    search: SearchSession,
}

impl App {
    /// `settings_path` is where changes from the settings screen are written;
    /// `None` keeps them in memory only.
    pub fn new(
        conn: Connection,
        settings: Settings,
        settings_path: Option<PathBuf>,
        search: SearchSession,
    ) -> Result<Self> {
        let lists = fetch_all_list_views(&conn)?;
        Ok(Self {
            conn,
            settings,
            settings_path,
            lists,
            selected: 0,
            screen: Screen::Lists,
            mode: Mode::Normal,
            status: None,
            search,
        })
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::CreatingList(form) => self.handle_list_form(code, None, form)?,
            Mode::RenamingList { id, form } => self.handle_list_form(code, Some(id), form)?,
            Mode::ConfirmListDelete(confirm) => self.handle_confirm_list_delete(code, confirm)?,
            Mode::ConfirmItemRemove(confirm) => self.handle_confirm_item_remove(code, confirm)?,
            Mode::CreatingBundle(form) => self.handle_bundle_form(code, form)?,
            Mode::SelectingBundleComponents { bundle, picker } => {
                self.handle_select_bundle_components(code, bundle, picker)?
            }
            Mode::EditingOverrides(form) => self.handle_overrides_form(code, form)?,
            Mode::EditingQuery(query) => self.handle_query_input(code, query)?,
            Mode::SelectingCategory(picker) => self.handle_select_category(code, picker)?,
            Mode::SelectingList(picker) => self.handle_select_list(code, picker)?,
            Mode::ProductDetail(summary) => self.handle_product_detail(code, summary)?,
            Mode::EditingName(name) => self.handle_name_input(code, name)?,
        };
        Ok(exit)
    }

    /// Apply finished background searches. Called once per frame.
    pub fn tick(&mut self) {
        if self.search.poll() == 0 {
            return;
        }
        if let Some(message) = self.search.error().map(str::to_string) {
            self.search.clear_error();
            self.set_status(message, StatusKind::Error);
        }
        if let Screen::Search(screen) = &mut self.screen {
            screen.selected = step_index(screen.selected, self.search.results().len(), 0);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Lists => self.handle_lists_key(code, exit),
            Screen::ListDetail(_) => self.handle_detail_key(code),
            Screen::Bundle(_) => self.handle_bundle_key(code),
            Screen::Search(_) => self.handle_search_key(code),
            Screen::Settings(_) => self.handle_settings_key(code),
        }
    }

    fn handle_lists_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Up => self.selected = step_index(self.selected, self.lists.len(), -1),
            KeyCode::Down => self.selected = step_index(self.selected, self.lists.len(), 1),
            KeyCode::Enter => {
                if let Some(id) = self.lists.get(self.selected).map(|view| view.list.id) {
                    self.open_list(id)?;
                }
            }
            KeyCode::Char('+') => return Ok(Mode::CreatingList(ListForm::default())),
            KeyCode::Char('e') => {
                if let Some(view) = self.lists.get(self.selected) {
                    return Ok(Mode::RenamingList {
                        id: view.list.id,
                        form: ListForm::from_list(&view.list),
                    });
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(view) = self.lists.get(self.selected) {
                    return Ok(Mode::ConfirmListDelete(ConfirmListDelete {
                        id: view.list.id,
                        name: view.list.name.clone(),
                        item_count: view.item_count(),
                    }));
                }
            }
            KeyCode::Char('f') => self.screen = Screen::Search(SearchScreen::default()),
            KeyCode::Char('s') => self.screen = Screen::Settings(SettingsScreen::default()),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Backspace => self.back_to_lists()?,
            KeyCode::Up | KeyCode::Down => {
                if let Screen::ListDetail(detail) = &mut self.screen {
                    detail.move_selection(if code == KeyCode::Up { -1 } else { 1 });
                }
            }
            KeyCode::Enter => match self.highlighted_item() {
                Some((_, Highlighted::Component(component))) => {
                    self.open_url(&component.name, component.purchase_url())
                }
                Some((_, Highlighted::Bundle(bundle))) => self.open_bundle(bundle.id)?,
                None => {}
            },
            KeyCode::Char('o') => {
                if let Some((_, Highlighted::Bundle(bundle))) = self.highlighted_item() {
                    self.open_url(&bundle.name, &bundle.url);
                }
            }
            KeyCode::Char('b') => {
                if let Screen::ListDetail(detail) = &self.screen {
                    if detail.view.components.is_empty() {
                        self.set_status("No components to bundle.", StatusKind::Error);
                    } else {
                        return Ok(Mode::CreatingBundle(BundleForm::default()));
                    }
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some((list_id, item)) = self.highlighted_item() {
                    let target = match item {
                        Highlighted::Component(component) => RemoveTarget::Component {
                            url: component.url,
                            name: component.name,
                        },
                        Highlighted::Bundle(bundle) => RemoveTarget::Bundle {
                            id: bundle.id,
                            name: bundle.name,
                        },
                    };
                    return Ok(Mode::ConfirmItemRemove(ConfirmItemRemove { list_id, target }));
                }
            }
            KeyCode::Char('c') => match self.highlighted_item() {
                Some((_, Highlighted::Component(component))) => {
                    return Ok(Mode::EditingOverrides(OverridesForm::from_component(
                        &component,
                    )));
                }
                Some((_, Highlighted::Bundle(_))) => self.set_status(
                    "Open the bundle to edit its components.",
                    StatusKind::Error,
                ),
                None => {}
            },
            KeyCode::Char('f') => self.screen = Screen::Search(SearchScreen::default()),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_bundle_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Bundle(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        match code {
            KeyCode::Esc | KeyCode::Backspace => {
                let list_id = screen.bundle.bundle.list_id;
                self.open_list(list_id)?;
            }
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Enter => {
                if let Some(component) = screen.current_component().cloned() {
                    self.open_url(&component.name, component.purchase_url());
                }
            }
            KeyCode::Char('o') => {
                let bundle = screen.bundle.bundle.clone();
                self.open_url(&bundle.name, &bundle.url);
            }
            KeyCode::Char('c') => {
                if let Some(component) = screen.current_component() {
                    return Ok(Mode::EditingOverrides(OverridesForm::from_component(
                        component,
                    )));
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                let bundle = &screen.bundle.bundle;
                return Ok(Mode::ConfirmItemRemove(ConfirmItemRemove {
                    list_id: bundle.list_id,
                    target: RemoveTarget::Bundle {
                        id: bundle.id,
                        name: bundle.name.clone(),
                    },
                }));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Search(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let count = self.search.results().len();
        match code {
            KeyCode::Esc => self.back_to_lists()?,
            KeyCode::Char('/') => return Ok(Mode::EditingQuery(screen.query.clone())),
            KeyCode::Char('c') => return Ok(Mode::SelectingCategory(CategoryPicker::default())),
            KeyCode::Up => screen.selected = step_index(screen.selected, count, -1),
            KeyCode::Down => {
                if screen.selected + 1 >= count && self.search.has_more() {
                    self.search.load_next_page();
                } else {
                    screen.selected = step_index(screen.selected, count, 1);
                }
            }
            KeyCode::Char('n') => {
                if !self.search.load_next_page() && !self.search.is_loading() {
                    self.set_status("No more results.", StatusKind::Info);
                }
            }
            KeyCode::Enter => {
                if let Some(summary) = self.current_result() {
                    self.search.request_detail(&summary.url);
                    return Ok(Mode::ProductDetail(summary));
                }
            }
            KeyCode::Char('a') => {
                if let Some(summary) = self.current_result() {
                    return self.pick_list_for(summary);
                }
            }
            KeyCode::Char('o') => {
                if let Some(summary) = self.current_result() {
                    self.open_url(&summary.name, &summary.url);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_settings_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Settings(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let row = screen.row;
        match (code, row) {
            (KeyCode::Esc, _) => self.back_to_lists()?,
            (KeyCode::Up, _) => screen.row = row.step(-1),
            (KeyCode::Down, _) => screen.row = row.step(1),
            (KeyCode::Left | KeyCode::Right, SettingsRow::Region) => {
                self.settings
                    .cycle_region(if code == KeyCode::Left { -1 } else { 1 });
                self.search.set_region(self.settings.region_code());
                self.persist_settings();
            }
            (KeyCode::Char(' ') | KeyCode::Enter, SettingsRow::CustomPrices) => {
                self.settings.use_custom_prices = !self.settings.use_custom_prices;
                self.persist_settings();
            }
            (KeyCode::Enter, SettingsRow::DisplayName) => {
                return Ok(Mode::EditingName(self.settings.display_name.clone()));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_list_form(
        &mut self,
        code: KeyCode,
        id: Option<i64>,
        mut form: ListForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Left => form.cycle_icon(-1),
            KeyCode::Right | KeyCode::Tab => form.cycle_icon(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_list(id, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(match (keep_open, id) {
            (false, _) => Mode::Normal,
            (true, Some(id)) => Mode::RenamingList { id, form },
            (true, None) => Mode::CreatingList(form),
        })
    }

    fn handle_confirm_list_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmListDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_list_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmListDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmListDelete(confirm)),
        }
    }

    fn handle_confirm_item_remove(
        &mut self,
        code: KeyCode,
        confirm: ConfirmItemRemove,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_item_remove(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmItemRemove(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmItemRemove(confirm)),
        }
    }

    fn handle_bundle_form(&mut self, code: KeyCode, mut form: BundleForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Bundle cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(1),
            KeyCode::BackTab | KeyCode::Up => form.next_field(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(bundle) => {
                    if let Screen::ListDetail(detail) = &self.screen {
                        let picker = ComponentPicker::new(&detail.view);
                        return Ok(Mode::SelectingBundleComponents { bundle, picker });
                    }
                    return Ok(Mode::Normal);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::CreatingBundle(form))
    }

    fn handle_select_bundle_components(
        &mut self,
        code: KeyCode,
        bundle: NewBundle,
        mut picker: ComponentPicker,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Bundle cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::Char(' ') => picker.toggle_current_selection(),
            KeyCode::Enter => {
                let selection = picker.checked_urls();
                match create_bundle(&mut self.conn, picker.list_id, &bundle, &selection) {
                    Ok(created) => {
                        self.refresh()?;
                        self.set_status(
                            format!(
                                "Bundled {} components into {}.",
                                selection.len(),
                                created.name
                            ),
                            StatusKind::Info,
                        );
                        return Ok(Mode::Normal);
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            _ => {}
        }
        Ok(Mode::SelectingBundleComponents { bundle, picker })
    }

    fn handle_overrides_form(&mut self, code: KeyCode, mut form: OverridesForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.toggle_field(true),
            KeyCode::BackTab | KeyCode::Up => form.toggle_field(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                match update_component_overrides(&self.conn, &form.url, &form.overrides()) {
                    Ok(()) => {
                        self.refresh()?;
                        self.set_status(
                            format!("Updated custom values for {}.", form.name),
                            StatusKind::Info,
                        );
                        return Ok(Mode::Normal);
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::EditingOverrides(form))
    }

    fn handle_query_input(&mut self, code: KeyCode, mut query: String) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Enter => {
                let text = query.trim().to_string();
                if text.is_empty() {
                    self.set_status("Enter a search term.", StatusKind::Error);
                } else {
                    self.run_search(SearchCriteria::Query(text));
                    if let Screen::Search(screen) = &mut self.screen {
                        screen.query = query;
                    }
                    return Ok(Mode::Normal);
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => query.push(ch),
            _ => {}
        }
        Ok(Mode::EditingQuery(query))
    }

    fn handle_select_category(&mut self, code: KeyCode, mut picker: CategoryPicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::PageUp => picker.move_selection(-5),
            KeyCode::PageDown => picker.move_selection(5),
            KeyCode::Enter => {
                if let Some((_, key)) = picker.current() {
                    self.run_search(SearchCriteria::Category(key.to_string()));
                }
                return Ok(Mode::Normal);
            }
            _ => {}
        }
        Ok(Mode::SelectingCategory(picker))
    }

    fn handle_select_list(&mut self, code: KeyCode, mut picker: ListPicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::Enter => {
                let Some(list) = picker.current_list().cloned() else {
                    return Ok(Mode::SelectingList(picker));
                };
                match add_component_to_list(&mut self.conn, list.id, &picker.component) {
                    Ok(()) => {
                        self.refresh()?;
                        self.set_status(
                            format!("Added {} to {}.", picker.component.name, list.name),
                            StatusKind::Info,
                        );
                        return Ok(Mode::Normal);
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            _ => {}
        }
        Ok(Mode::SelectingList(picker))
    }

    fn handle_product_detail(&mut self, code: KeyCode, summary: PartSummary) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Enter => {
                self.search.close_detail();
                Ok(Mode::Normal)
            }
            KeyCode::Char('a') => {
                self.search.close_detail();
                self.pick_list_for(summary)
            }
            KeyCode::Char('o') => {
                self.open_url(&summary.name, &summary.url);
                Ok(Mode::ProductDetail(summary))
            }
            _ => Ok(Mode::ProductDetail(summary)),
        }
    }

    fn handle_name_input(&mut self, code: KeyCode, mut name: String) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Enter => {
                self.settings.display_name = name.trim().to_string();
                self.persist_settings();
                return Ok(Mode::Normal);
            }
            KeyCode::Char(ch) if !ch.is_control() => name.push(ch),
            _ => {}
        }
        Ok(Mode::EditingName(name))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Lists => self.draw_lists(frame, content_area),
            Screen::ListDetail(detail) => self.draw_list_detail(frame, content_area, detail),
            Screen::Bundle(screen) => self.draw_bundle(frame, content_area, screen),
            Screen::Search(screen) => self.draw_search(frame, content_area, screen),
            Screen::Settings(screen) => self.draw_settings(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::CreatingList(form) => self.draw_list_form(frame, area, "New List", form),
            Mode::RenamingList { form, .. } => self.draw_list_form(frame, area, "Edit List", form),
            Mode::ConfirmListDelete(confirm) => self.draw_confirm_list(frame, area, confirm),
            Mode::ConfirmItemRemove(confirm) => self.draw_confirm_item(frame, area, confirm),
            Mode::CreatingBundle(form) => self.draw_bundle_form(frame, area, form),
            Mode::SelectingBundleComponents { bundle, picker } => {
                self.draw_component_picker(frame, area, bundle, picker)
            }
            Mode::EditingOverrides(form) => self.draw_overrides_form(frame, area, form),
            Mode::EditingQuery(query) => self.draw_input_bar(frame, area, "Search", query),
            Mode::SelectingCategory(picker) => self.draw_category_picker(frame, area, picker),
            Mode::SelectingList(picker) => self.draw_list_picker(frame, area, picker),
            Mode::ProductDetail(summary) => self.draw_product_detail(frame, area, summary),
            Mode::EditingName(name) => self.draw_input_bar(frame, area, "Display name", name),
            Mode::Normal => {}
        }
    }

    fn draw_lists(&self, frame: &mut Frame, area: Rect) {
        let title = if self.settings.display_name.trim().is_empty() {
            "Part Lists".to_string()
        } else {
            format!("{}'s Part Lists", self.settings.display_name.trim())
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.lists.is_empty() {
            let message = Paragraph::new("No lists yet. Press '+' to create one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .lists
            .iter()
            .map(|view| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", view.list.icon.glyph()),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        view.list.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(
                        "   {} items   {}",
                        view.item_count(),
                        self.list_total(view)
                    )),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_list_detail(&self, frame: &mut Frame, area: Rect, detail: &ListDetailScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(1)])
            .split(area);

        let view = &detail.view;
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    format!("{} {}", view.list.icon.glyph(), view.list.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  |  {} components, {} bundles",
                    view.components.len(),
                    view.bundles.len()
                )),
            ]),
            Line::from(Span::styled(
                self.list_total(view),
                Style::default().fg(Color::Green),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("List"));
        frame.render_widget(header, chunks[0]);

        if view.is_empty() {
            let message = Paragraph::new("This list is empty. Press 'f' to search for parts.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let width = chunks[1].width.saturating_sub(30) as usize;
        let items: Vec<ListItem> = view
            .items()
            .into_iter()
            .map(|item| match item {
                models::ListItem::Component(component) => {
                    ListItem::new(self.component_line(component, width))
                }
                models::ListItem::Bundle(bundle) => ListItem::new(Line::from(vec![
                    Span::styled("[Bundle] ", Style::default().fg(Color::Magenta)),
                    Span::raw(truncate(&bundle.bundle.name, width)),
                    Span::raw(format!(
                        "  {}  ({} parts, {})",
                        bundle.bundle.price,
                        bundle.components.len(),
                        bundle.bundle.vendor
                    )),
                ])),
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Items"))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(detail.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_bundle(&self, frame: &mut Frame, area: Rect, screen: &BundleScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT + 1), Constraint::Min(1)])
            .split(area);

        let bundle = &screen.bundle.bundle;
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    bundle.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  |  {}  |  {}", bundle.vendor, bundle.price)),
            ]),
            Line::from(Span::styled(
                bundle.url.clone(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(format!("{} components", screen.bundle.components.len())),
        ])
        .block(Block::default().borders(Borders::ALL).title("Bundle"));
        frame.render_widget(header, chunks[0]);

        let width = chunks[1].width.saturating_sub(30) as usize;
        let items: Vec<ListItem> = screen
            .bundle
            .components
            .iter()
            .map(|component| ListItem::new(self.component_line(component, width)))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Components"))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(screen.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect, screen: &SearchScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(1)])
            .split(area);

        let summary = match self.search.criteria() {
            Some(criteria) => format!("Results for {}", criteria.describe()),
            None => "Press '/' to search or 'c' to browse a category.".to_string(),
        };
        let progress = if self.search.is_loading() {
            Span::styled("Loading...", Style::default().fg(Color::Yellow))
        } else if self.search.criteria().is_some() {
            Span::raw(format!(
                "{} results, {} pages, region {}",
                self.search.results().len(),
                self.search.total_pages(),
                self.settings.region
            ))
        } else {
            Span::raw("")
        };
        let header = Paragraph::new(vec![Line::from(summary), Line::from(progress)])
            .block(Block::default().borders(Borders::ALL).title("Search"));
        frame.render_widget(header, chunks[0]);

        let width = chunks[1].width.saturating_sub(20) as usize;
        let mut items: Vec<ListItem> = self
            .search
            .results()
            .iter()
            .map(|result| {
                ListItem::new(Line::from(vec![
                    Span::raw(truncate(&result.name, width)),
                    Span::styled(
                        format!("  {}", result.price),
                        Style::default().fg(Color::Green),
                    ),
                ]))
            })
            .collect();
        if self.search.has_more() && !self.search.results().is_empty() {
            items.push(ListItem::new(Span::styled(
                "More results: press 'n' or Down",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !self.search.results().is_empty() {
            state.select(Some(screen.selected));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_settings(&self, frame: &mut Frame, area: Rect, screen: &SettingsScreen) {
        let lines: Vec<Line> = SettingsRow::ALL
            .iter()
            .map(|row| {
                let (label, value) = match row {
                    SettingsRow::Region => (
                        "Region",
                        format!(
                            "< {} ({}) >",
                            self.settings.region,
                            self.settings.currency_symbol()
                        ),
                    ),
                    SettingsRow::CustomPrices => (
                        "Use custom prices",
                        if self.settings.use_custom_prices {
                            "[x]".to_string()
                        } else {
                            "[ ]".to_string()
                        },
                    ),
                    SettingsRow::DisplayName => ("Display name", self.settings.display_name.clone()),
                };
                field_line(label, &value, "<not set>", *row == screen.row)
            })
            .collect();

        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Settings"));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let keys: Vec<(&str, &str)> = match (&self.screen, &self.mode) {
            (_, Mode::SelectingBundleComponents { .. }) => vec![
                ("[Up/Down]", "Navigate"),
                ("[Space]", "Toggle"),
                ("[Enter]", "Create Bundle"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::SelectingList(_) | Mode::SelectingCategory(_)) => vec![
                ("[Up/Down]", "Navigate"),
                ("[Enter]", "Choose"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ProductDetail(_)) => vec![
                ("[a]", "Add to List"),
                ("[o]", "Open"),
                ("[Esc]", "Close"),
            ],
            (_, mode) if !matches!(mode, Mode::Normal) => {
                vec![("[Enter]", "Confirm"), ("[Esc]", "Cancel")]
            }
            (Screen::Lists, _) => vec![
                ("[Enter]", "Open"),
                ("[+]", "New"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[f]", "Find Parts"),
                ("[s]", "Settings"),
                ("[q]", "Quit"),
            ],
            (Screen::ListDetail(_), _) => vec![
                ("[Enter]", "Open"),
                ("[b]", "Bundle"),
                ("[c]", "Custom Values"),
                ("[-]", "Remove"),
                ("[f]", "Find Parts"),
                ("[Esc]", "Back"),
            ],
            (Screen::Bundle(_), _) => vec![
                ("[Enter]", "Open Part"),
                ("[o]", "Open Bundle"),
                ("[c]", "Custom Values"),
                ("[-]", "Remove Bundle"),
                ("[Esc]", "Back"),
            ],
            (Screen::Search(_), _) => vec![
                ("[/]", "Search"),
                ("[c]", "Category"),
                ("[Enter]", "Details"),
                ("[a]", "Add to List"),
                ("[n]", "More"),
                ("[Esc]", "Back"),
            ],
            (Screen::Settings(_), _) => vec![
                ("[Left/Right]", "Region"),
                ("[Space]", "Toggle"),
                ("[Enter]", "Edit"),
                ("[Esc]", "Back"),
            ],
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(format!(" {action}   ")),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_list_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ListForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(form_hint(
            &form.error,
            "Enter to save | Left/Right for icon | Esc to cancel",
        ));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = inner.x + "Name: ".len() as u16 + form.name.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_list(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmListDelete) {
        let lines = vec![
            Line::from(format!("Delete list \"{}\"?", confirm.name)),
            Line::from(format!(
                "Its {} items go with it; parts used elsewhere are kept.",
                confirm.item_count
            )),
        ];
        draw_confirm(frame, area, "Confirm Delete", lines);
    }

    fn draw_confirm_item(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmItemRemove) {
        draw_confirm(
            frame,
            area,
            "Remove Item",
            vec![Line::from(confirm.prompt())],
        );
    }

    fn draw_bundle_form(&self, frame: &mut Frame, area: Rect, form: &BundleForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("New Bundle").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(form_hint(
            &form.error,
            "Enter to choose components | Tab to switch | Esc to cancel",
        ));
        frame.render_widget(Paragraph::new(lines), inner);

        let (column, row) = form.cursor();
        frame.set_cursor_position((inner.x + column, inner.y + row));
    }

    fn draw_component_picker(
        &self,
        frame: &mut Frame,
        area: Rect,
        bundle: &NewBundle,
        picker: &ComponentPicker,
    ) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Components for {}", bundle.name))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = picker
            .components
            .iter()
            .enumerate()
            .map(|(index, component)| {
                let checkbox = if picker.is_checked(index) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{checkbox} {}  {}", component.name, component.price))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn draw_overrides_form(&self, frame: &mut Frame, area: Rect, form: &OverridesForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Custom values: {}", form.name))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Blank fields use the listed value | Enter to save | Esc to cancel",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_input_bar(&self, frame: &mut Frame, area: Rect, title: &str, value: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        let prefix = format!("{title}: ");
        let paragraph = Paragraph::new(Span::raw(format!("{prefix}{value}"))).block(block.clone());
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prefix.len() as u16 + value.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_category_picker(&self, frame: &mut Frame, area: Rect, picker: &CategoryPicker) {
        let popup_area = centered_rect(50, 70, area);
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = CATEGORIES
            .iter()
            .map(|(name, _)| ListItem::new(*name))
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Browse Category").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_list_picker(&self, frame: &mut Frame, area: Rect, picker: &ListPicker) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Add {} to...", picker.component.name))
            .borders(Borders::ALL);
        if picker.lists.is_empty() {
            let message = Paragraph::new("No lists yet. Create one from the main screen.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, popup_area);
            return;
        }

        let items: Vec<ListItem> = picker
            .lists
            .iter()
            .map(|list| ListItem::new(format!("{} {}", list.icon.glyph(), list.name)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_product_detail(&self, frame: &mut Frame, area: Rect, summary: &PartSummary) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let mut lines = vec![
            Line::from(Span::styled(
                summary.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Listed price: {}", summary.price)),
            Line::from(""),
        ];

        match self.search.detail() {
            DetailState::Idle | DetailState::Loading(_) => {
                lines.push(Line::from(Span::styled(
                    "Loading details...",
                    Style::default().fg(Color::Yellow),
                )));
            }
            DetailState::Failed(message) => {
                lines.push(Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            DetailState::Loaded(detail) => {
                if let Some(best) = detail.best_price() {
                    lines.push(Line::from(format!(
                        "Best price: {}{:.2} at {}{}",
                        self.settings.currency_symbol(),
                        best.value,
                        best.seller,
                        if best.in_stock { "" } else { " (out of stock)" }
                    )));
                }
                if let Some(rating) = &detail.rating {
                    if let (Some(average), Some(count)) = (rating.average, rating.count) {
                        lines.push(Line::from(format!("Rating: {average:.1} ({count} reviews)")));
                    }
                }
                lines.push(Line::from(""));
                lines.extend(
                    detail
                        .specs
                        .iter()
                        .map(|(key, value)| Line::from(format!("{key}: {value}"))),
                );
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Product").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn component_line(&self, component: &Component, width: usize) -> Line<'static> {
        let overrides = &component.overrides;
        let price = match (&overrides.price, self.settings.use_custom_prices) {
            (Some(custom), true) => format!("{custom} (custom)"),
            _ => component.price.clone(),
        };
        let mut spans = vec![
            Span::raw(truncate(&component.name, width)),
            Span::styled(format!("  {price}"), Style::default().fg(Color::Green)),
        ];
        if let Some(vendor) = &overrides.vendor {
            spans.push(Span::styled(
                format!("  @ {vendor}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }

    fn list_total(&self, view: &ListView) -> String {
        format_total(
            self.settings.currency_symbol(),
            total_price_with(view, self.settings.use_custom_prices),
        )
    }

    fn highlighted_item(&self) -> Option<(i64, Highlighted)> {
        let Screen::ListDetail(detail) = &self.screen else {
            return None;
        };
        let item = match detail.current_item()? {
            models::ListItem::Component(component) => Highlighted::Component(component.clone()),
            models::ListItem::Bundle(bundle) => Highlighted::Bundle(bundle.bundle.clone()),
        };
        Some((detail.view.list.id, item))
    }

    fn current_result(&self) -> Option<PartSummary> {
        let Screen::Search(screen) = &self.screen else {
            return None;
        };
        self.search.results().get(screen.selected).cloned()
    }

    fn pick_list_for(&mut self, summary: PartSummary) -> Result<Mode> {
        let picker = ListPicker::load(&self.conn, summary.into_component())?;
        if picker.lists.is_empty() {
            self.set_status("Create a list first.", StatusKind::Error);
            return Ok(Mode::Normal);
        }
        Ok(Mode::SelectingList(picker))
    }

    fn run_search(&mut self, criteria: SearchCriteria) {
        info!("search {}", criteria.describe());
        self.search.set_page_size(self.settings.page_size);
        self.search.start(criteria);
        if let Screen::Search(screen) = &mut self.screen {
            screen.selected = 0;
        }
        self.clear_status();
    }

    fn open_list(&mut self, list_id: i64) -> Result<()> {
        match ListDetailScreen::load(&self.conn, list_id) {
            Ok(detail) => self.screen = Screen::ListDetail(detail),
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                self.back_to_lists()?;
            }
        }
        Ok(())
    }

    fn open_bundle(&mut self, bundle_id: i64) -> Result<()> {
        match BundleScreen::load(&self.conn, bundle_id) {
            Ok(screen) => self.screen = Screen::Bundle(screen),
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                self.refresh()?;
            }
        }
        Ok(())
    }

    fn back_to_lists(&mut self) -> Result<()> {
        self.screen = Screen::Lists;
        self.reload_lists(None)
    }

    fn open_url(&mut self, name: &str, url: &str) {
        if url.trim().is_empty() {
            self.set_status(format!("{name} has no link."), StatusKind::Error);
        } else if let Err(err) = open_link(url) {
            warn!("failed to open {url}: {err}");
            self.set_status(format!("Failed to open link: {err}"), StatusKind::Error);
        } else {
            self.set_status(format!("Opened {name}."), StatusKind::Info);
        }
    }

    /// Re-read everything the current screen shows.
    fn refresh(&mut self) -> Result<()> {
        self.reload_lists(None)?;
        let bundle_gone = match &mut self.screen {
            Screen::ListDetail(detail) => {
                detail.refresh(&self.conn)?;
                false
            }
            Screen::Bundle(screen) => {
                let bundle_id = screen.bundle.bundle.id;
                match BundleScreen::load(&self.conn, bundle_id) {
                    Ok(mut reloaded) => {
                        reloaded.selected = screen.selected;
                        reloaded.move_selection(0);
                        *screen = reloaded;
                        false
                    }
                    Err(_) => true,
                }
            }
            _ => false,
        };
        if bundle_gone {
            if let Screen::Bundle(screen) = &self.screen {
                let list_id = screen.bundle.bundle.list_id;
                self.open_list(list_id)?;
            }
        }
        Ok(())
    }

    fn reload_lists(&mut self, select_id: Option<i64>) -> Result<()> {
        self.lists = fetch_all_list_views(&self.conn)?;
        if let Some(id) = select_id {
            if let Some(index) = self.lists.iter().position(|view| view.list.id == id) {
                self.selected = index;
            }
        }
        self.selected = step_index(self.selected, self.lists.len(), 0);
        Ok(())
    }

    fn save_list(&mut self, id: Option<i64>, form: &ListForm) -> Result<()> {
        match id {
            None => {
                let list = create_list(&self.conn, &form.name, form.icon)?;
                self.reload_lists(Some(list.id))?;
                self.set_status(format!("Created {}.", list.name), StatusKind::Info);
            }
            Some(id) => {
                rename_list(&self.conn, id, &form.name, form.icon)?;
                self.reload_lists(Some(id))?;
                self.set_status(format!("Updated {}.", form.name.trim()), StatusKind::Info);
            }
        }
        Ok(())
    }

    fn perform_list_delete(&mut self, confirm: &ConfirmListDelete) -> Result<()> {
        let removed = delete_list(&mut self.conn, confirm.id)?;
        self.back_to_lists()?;
        self.set_status(
            format!(
                "Deleted {} ({} unused components cleaned up).",
                confirm.name,
                removed.len()
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_item_remove(&mut self, confirm: &ConfirmItemRemove) -> Result<()> {
        match &confirm.target {
            RemoveTarget::Component { url, name } => {
                remove_component_from_list(&mut self.conn, confirm.list_id, url)?;
                self.refresh()?;
                self.set_status(format!("Removed {name}."), StatusKind::Info);
            }
            RemoveTarget::Bundle { id, name } => {
                remove_bundle(&mut self.conn, *id)?;
                self.reload_lists(None)?;
                self.open_list(confirm.list_id)?;
                self.set_status(format!("Removed bundle {name}."), StatusKind::Info);
            }
        }
        Ok(())
    }

    fn persist_settings(&mut self) {
        let result = self
            .settings_path
            .as_deref()
            .map(|path| self.settings.save(path));
        match result {
            Some(Err(err)) => self.set_status(surface_error(&err), StatusKind::Error),
            _ => self.set_status("Settings saved.", StatusKind::Info),
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Error text when the form has one, otherwise the key hint.
fn form_hint(error: &Option<String>, hint: &str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::Gray),
        )),
    }
}

fn draw_confirm(frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Y to confirm or N / Esc to cancel.",
        Style::default().fg(Color::Gray),
    )));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}
