use std::sync::Arc;

use adw::prelude::*;
use relm4::prelude::*;
use tokio::sync::mpsc;

use crate::backend::{ChatBackend, HealthStatus, HttpBackend};
use crate::config::{self, ClientConfig};
use crate::models::{AssistantModel, Conversation, FileRef};
use crate::services::history::{self, HistoryDatabase, HistoryOp};
use crate::services::{ChatFlow, ConversationStore, Outcome};
use crate::ui::chat_view::{ChatView, ChatViewMsg, ChatViewOutput};
use crate::ui::file_preview::{FilePreviewMsg, FilePreviewOutput, FilePreviewView};
use crate::ui::sidebar::{Sidebar, SidebarMsg, SidebarOutput};
use crate::ui::window;

const WELCOME_TEXT: &str = "Asisten AI untuk mencari dokumen hukum di Google Drive. \
Mulai chat baru untuk bertanya tentang UU, peraturan, atau dokumen hukum lainnya.";

pub struct App {
    store: ConversationStore,
    flow: ChatFlow,
    backend: Arc<dyn ChatBackend>,
    /// Queue into the history writer; `None` when history is disabled.
    history: Option<mpsc::UnboundedSender<HistoryOp>>,
    /// Set once the window asked to close and the writer is draining.
    closing: bool,
    selected_model: AssistantModel,
    sidebar: Controller<Sidebar>,
    chat_view: Controller<ChatView>,
    file_preview: Controller<FilePreviewView>,
    toast_overlay: adw::ToastOverlay,
    content_stack: gtk::Stack,
    welcome_page: adw::StatusPage,
}

#[derive(Debug)]
pub enum AppMsg {
    NewChat,
    ConversationSelected(String),
    DeleteConversation(String),
    SendMessage(String),
    ModelSelected(AssistantModel),
    ModelUnavailable(AssistantModel),
    OpenFile(FileRef),
    OpenUri(String),
    ClosePreview,
    ShowAbout,
    ShowShortcuts,
    CloseRequested,
}

#[derive(Debug)]
pub enum AppCmd {
    HealthChecked(Result<HealthStatus, String>),
    HistoryLoaded(Vec<Conversation>),
    HistoryFailed(String),
    HistoryClosed,
    ReplySettled(Outcome),
}

#[relm4::component(pub, async)]
impl AsyncComponent for App {
    type Init = ClientConfig;
    type Input = AppMsg;
    type Output = ();
    type CommandOutput = AppCmd;

    view! {
        adw::ApplicationWindow {
            set_title: Some(config::APP_NAME),
            set_default_width: 1100,
            set_default_height: 760,
            set_width_request: 360,
            set_height_request: 480,

            #[local_ref]
            toast_overlay -> adw::ToastOverlay {},
        }
    }

    async fn init(
        client_config: Self::Init,
        root: Self::Root,
        sender: AsyncComponentSender<Self>,
    ) -> AsyncComponentParts<Self> {
        let sidebar = Sidebar::builder()
            .launch(())
            .forward(sender.input_sender(), |output| match output {
                SidebarOutput::NewChat => AppMsg::NewChat,
                SidebarOutput::ConversationSelected(id) => AppMsg::ConversationSelected(id),
                SidebarOutput::DeleteConversation(id) => AppMsg::DeleteConversation(id),
                SidebarOutput::ModelSelected(model) => AppMsg::ModelSelected(model),
                SidebarOutput::ModelUnavailable(model) => AppMsg::ModelUnavailable(model),
            });

        let chat_view = ChatView::builder()
            .launch(())
            .forward(sender.input_sender(), |output| match output {
                ChatViewOutput::SendMessage(text) => AppMsg::SendMessage(text),
                ChatViewOutput::OpenFile(file) => AppMsg::OpenFile(file),
                ChatViewOutput::OpenUri(url) => AppMsg::OpenUri(url),
            });

        let file_preview = FilePreviewView::builder()
            .launch(())
            .forward(sender.input_sender(), |output| match output {
                FilePreviewOutput::OpenUri(url) => AppMsg::OpenUri(url),
            });

        tracing::info!("Using backend at {}", client_config.backend_url);
        let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(&client_config));

        let toast_overlay = adw::ToastOverlay::new();
        toast_overlay.set_hexpand(true);
        toast_overlay.set_vexpand(true);

        let content_stack = gtk::Stack::new();
        content_stack.set_hexpand(true);
        content_stack.set_vexpand(true);

        // Welcome page
        let welcome_page = adw::StatusPage::new();
        welcome_page.set_title(config::APP_NAME);
        welcome_page.set_icon_name(Some("x-office-document-symbolic"));
        let description = welcome_description(AssistantModel::default());
        welcome_page.set_description(Some(description.as_str()));
        let new_chat_btn = gtk::Button::builder()
            .label("Chat Baru")
            .halign(gtk::Align::Center)
            .build();
        new_chat_btn.add_css_class("suggested-action");
        new_chat_btn.add_css_class("pill");
        let sender_btn = sender.input_sender().clone();
        new_chat_btn.connect_clicked(move |_| {
            let _ = sender_btn.send(AppMsg::NewChat);
        });
        welcome_page.set_child(Some(&new_chat_btn));
        content_stack.add_named(&welcome_page, Some("empty"));

        // Chat page; the document preview floats above it
        let chat_overlay = gtk::Overlay::new();
        chat_overlay.set_child(Some(chat_view.widget()));
        chat_overlay.add_overlay(file_preview.widget());
        content_stack.add_named(&chat_overlay, Some("chat"));

        content_stack.set_visible_child_name("empty");

        let content_header = adw::HeaderBar::new();
        content_header.set_show_start_title_buttons(false);

        let menu = gio::Menu::new();
        menu.append(Some("Pintasan Keyboard"), Some("app.show-shortcuts"));
        menu.append(Some("Tentang NLP Hukum AI"), Some("app.about"));
        let menu_button = gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&menu)
            .build();
        content_header.pack_end(&menu_button);

        let content_toolbar = adw::ToolbarView::new();
        content_toolbar.add_top_bar(&content_header);
        content_toolbar.set_content(Some(&content_stack));

        let content_page = adw::NavigationPage::builder()
            .title("Chat")
            .tag("content")
            .child(&content_toolbar)
            .build();

        let sidebar_page = adw::NavigationPage::builder()
            .title("Riwayat Chat")
            .tag("sidebar")
            .child(sidebar.widget())
            .build();

        let split_view = adw::NavigationSplitView::new();
        split_view.set_hexpand(true);
        split_view.set_vexpand(true);
        split_view.set_min_sidebar_width(220.0);
        split_view.set_max_sidebar_width(300.0);
        split_view.set_sidebar(Some(&sidebar_page));
        split_view.set_content(Some(&content_page));

        if let Ok(condition) = adw::BreakpointCondition::parse("max-width: 600px") {
            let breakpoint = adw::Breakpoint::new(condition);
            breakpoint.add_setter(&split_view, "collapsed", Some(&true.to_value()));
            breakpoint.add_setter(
                &content_header,
                "show-start-title-buttons",
                Some(&true.to_value()),
            );
            root.add_breakpoint(breakpoint);
        }

        toast_overlay.set_child(Some(&split_view));

        // History is opened off the UI thread; the writer drains whatever was
        // queued in the meantime once loading has finished.
        let history = client_config.history_path.clone().map(|path| {
            let (tx, rx) = mpsc::unbounded_channel();
            sender.command(move |out, _| {
                Box::pin(async move {
                    let db = match HistoryDatabase::open(&path).await {
                        Ok(db) => db,
                        Err(e) => {
                            let _ = out.send(AppCmd::HistoryFailed(format!("{:#}", e)));
                            let _ = out.send(AppCmd::HistoryClosed);
                            return;
                        }
                    };
                    match db.load_conversations().await {
                        Ok(conversations) => {
                            let _ = out.send(AppCmd::HistoryLoaded(conversations));
                        }
                        Err(e) => {
                            let _ = out.send(AppCmd::HistoryFailed(format!("{:#}", e)));
                        }
                    }
                    history::run_writer(db, rx).await;
                    let _ = out.send(AppCmd::HistoryClosed);
                })
            });
            tx
        });

        let model = App {
            store: ConversationStore::new(),
            flow: ChatFlow::new(),
            backend,
            history,
            closing: false,
            selected_model: AssistantModel::default(),
            sidebar,
            chat_view,
            file_preview,
            toast_overlay: toast_overlay.clone(),
            content_stack,
            welcome_page,
        };

        let widgets = view_output!();

        // Closing waits for the history writer to finish the queue.
        let sender_quit = sender.input_sender().clone();
        root.connect_close_request(move |_| {
            let _ = sender_quit.send(AppMsg::CloseRequested);
            gtk::glib::Propagation::Stop
        });

        // App actions
        let app = relm4::main_adw_application();

        let sender_about = sender.input_sender().clone();
        let about_action = gio::SimpleAction::new("about", None);
        about_action.connect_activate(move |_, _| {
            let _ = sender_about.send(AppMsg::ShowAbout);
        });
        app.add_action(&about_action);

        let sender_new = sender.input_sender().clone();
        let new_chat_action = gio::SimpleAction::new("new-chat", None);
        new_chat_action.connect_activate(move |_, _| {
            let _ = sender_new.send(AppMsg::NewChat);
        });
        app.add_action(&new_chat_action);
        app.set_accels_for_action("app.new-chat", &["<Control>n"]);

        let sender_close = sender.input_sender().clone();
        let close_preview_action = gio::SimpleAction::new("close-preview", None);
        close_preview_action.connect_activate(move |_, _| {
            let _ = sender_close.send(AppMsg::ClosePreview);
        });
        app.add_action(&close_preview_action);
        app.set_accels_for_action("app.close-preview", &["Escape"]);

        let sender_shortcuts = sender.input_sender().clone();
        let shortcuts_action = gio::SimpleAction::new("show-shortcuts", None);
        shortcuts_action.connect_activate(move |_, _| {
            let _ = sender_shortcuts.send(AppMsg::ShowShortcuts);
        });
        app.add_action(&shortcuts_action);
        app.set_accels_for_action("app.show-shortcuts", &["<Control>slash"]);

        // Startup health check
        let backend = model.backend.clone();
        sender.command(move |out, _| {
            Box::pin(async move {
                let result = backend.health().await.map_err(|e| e.to_string());
                let _ = out.send(AppCmd::HealthChecked(result));
            })
        });

        AsyncComponentParts { model, widgets }
    }

    async fn update(
        &mut self,
        msg: Self::Input,
        sender: AsyncComponentSender<Self>,
        root: &Self::Root,
    ) {
        match msg {
            AppMsg::NewChat => {
                let conversation = self.store.create_conversation().clone();
                tracing::debug!("Created conversation {}", conversation.id);

                self.persist(HistoryOp::InsertConversation(conversation.clone()));
                let id = conversation.id.clone();
                self.sidebar
                    .emit(SidebarMsg::AddConversation(conversation));
                self.sidebar.emit(SidebarMsg::SetActive(Some(id)));
                self.show_active_conversation();
            }
            AppMsg::ConversationSelected(id) => {
                self.store.set_active(Some(id.clone()));
                self.sidebar.emit(SidebarMsg::SetActive(Some(id)));
                self.show_active_conversation();
            }
            AppMsg::DeleteConversation(id) => {
                if self.flow.cancel_for(&id) {
                    tracing::info!("Cancelling pending request for deleted conversation {}", id);
                }
                if !self.store.delete_conversation(&id) {
                    return;
                }
                self.persist(HistoryOp::DeleteConversation(id.clone()));
                self.sidebar.emit(SidebarMsg::RemoveConversation(id));
                if self.store.active_id().is_none() {
                    self.file_preview.emit(FilePreviewMsg::Close);
                    self.show_active_conversation();
                }
            }
            AppMsg::SendMessage(text) => {
                self.handle_send_message(&text, sender);
            }
            AppMsg::ModelSelected(model) => {
                tracing::info!("Model set to {}", model.display_name());
                self.selected_model = model;
                self.welcome_page
                    .set_description(Some(welcome_description(model).as_str()));
            }
            AppMsg::ModelUnavailable(model) => {
                self.show_toast(&format!("{} belum tersedia", model.display_name()));
            }
            AppMsg::OpenFile(file) => {
                self.file_preview.emit(FilePreviewMsg::Open(file));
            }
            AppMsg::OpenUri(uri) => {
                if let Err(e) =
                    gio::AppInfo::launch_default_for_uri(&uri, None::<&gio::AppLaunchContext>)
                {
                    tracing::error!("Failed to open {}: {}", uri, e);
                    self.show_toast("Tidak dapat membuka tautan");
                }
            }
            AppMsg::ClosePreview => {
                self.file_preview.emit(FilePreviewMsg::Close);
            }
            AppMsg::ShowAbout => {
                window::create_about_dialog(root);
            }
            AppMsg::ShowShortcuts => {
                window::create_shortcuts_window(root);
            }
            AppMsg::CloseRequested => {
                if self.closing {
                    return;
                }
                if self.history.take().is_some() {
                    tracing::info!("Saving pending history before exit");
                    self.closing = true;
                } else {
                    root.destroy();
                }
            }
        }
    }

    async fn update_cmd(
        &mut self,
        msg: Self::CommandOutput,
        _sender: AsyncComponentSender<Self>,
        root: &Self::Root,
    ) {
        match msg {
            AppCmd::HealthChecked(Ok(health)) => {
                if health.is_ready() {
                    tracing::info!(
                        "Backend online ({})",
                        health.mode.as_deref().unwrap_or("unknown mode")
                    );
                } else {
                    tracing::warn!("Backend reachable but not ready: {:?}", health);
                    self.show_toast("Model AI belum siap");
                }
            }
            AppCmd::HealthChecked(Err(e)) => {
                tracing::warn!("Backend health check failed: {}", e);
                self.show_toast("Server tidak dapat dihubungi");
            }
            AppCmd::HistoryLoaded(conversations) => {
                tracing::info!("Loaded {} saved conversations", conversations.len());
                self.store.merge_saved(conversations);
                self.sidebar.emit(SidebarMsg::LoadConversations(
                    self.store.conversations().to_vec(),
                ));
                self.sidebar
                    .emit(SidebarMsg::SetActive(self.store.active_id().map(str::to_string)));
            }
            AppCmd::HistoryFailed(e) => {
                tracing::error!("History unavailable: {}", e);
                self.history = None;
                self.show_toast("Riwayat chat tidak dapat dimuat");
            }
            AppCmd::HistoryClosed => {
                if self.closing {
                    root.destroy();
                }
            }
            AppCmd::ReplySettled(outcome) => {
                self.chat_view.emit(ChatViewMsg::SetLoading(false));
                self.chat_view.emit(ChatViewMsg::SetInputLocked(false));

                let Some((conversation_id, message)) = self.flow.finish(&mut self.store, outcome)
                else {
                    return;
                };
                self.persist(HistoryOp::InsertMessage {
                    conversation_id: conversation_id.clone(),
                    message: message.clone(),
                });
                if self.store.active_id() == Some(conversation_id.as_str()) {
                    self.chat_view.emit(ChatViewMsg::AddMessage(message));
                }
            }
        }
    }
}

impl App {
    fn show_toast(&self, message: &str) {
        let toast = adw::Toast::new(message);
        toast.set_timeout(3);
        self.toast_overlay.add_toast(toast);
    }

    fn persist(&mut self, op: HistoryOp) {
        if let Some(tx) = &self.history {
            if tx.send(op).is_err() {
                tracing::error!("History writer stopped; further changes are not saved");
                self.history = None;
            }
        }
    }

    /// Sync the content area with the store's active conversation.
    fn show_active_conversation(&self) {
        match self.store.active() {
            Some(conv) => {
                self.chat_view
                    .emit(ChatViewMsg::LoadMessages(conv.messages.clone()));
                let loading = self.flow.in_flight_conversation() == Some(conv.id.as_str());
                self.chat_view.emit(ChatViewMsg::SetLoading(loading));
                self.content_stack.set_visible_child_name("chat");
            }
            None => {
                self.chat_view.emit(ChatViewMsg::Clear);
                self.content_stack.set_visible_child_name("empty");
            }
        }
    }

    fn handle_send_message(&mut self, text: &str, sender: AsyncComponentSender<Self>) {
        let Some(dispatch) = self.flow.begin(&mut self.store, text) else {
            return;
        };

        self.chat_view.emit(ChatViewMsg::ClearInput);
        self.chat_view
            .emit(ChatViewMsg::AddMessage(dispatch.user_message.clone()));
        self.chat_view.emit(ChatViewMsg::SetLoading(true));
        self.chat_view.emit(ChatViewMsg::SetInputLocked(true));

        self.persist(HistoryOp::InsertMessage {
            conversation_id: dispatch.conversation_id.clone(),
            message: dispatch.user_message.clone(),
        });
        if let Some(title) = &dispatch.new_title {
            self.persist(HistoryOp::UpdateTitle {
                id: dispatch.conversation_id.clone(),
                title: title.clone(),
            });
            self.sidebar.emit(SidebarMsg::UpdateConversationTitle(
                dispatch.conversation_id.clone(),
                title.clone(),
            ));
        }

        let backend = self.backend.clone();
        sender.command(move |out, _| {
            Box::pin(async move {
                let outcome = ChatFlow::dispatch(backend.as_ref(), dispatch).await;
                let _ = out.send(AppCmd::ReplySettled(outcome));
            })
        });
    }
}

fn welcome_description(model: AssistantModel) -> String {
    format!("{}\n\nModel: {}", WELCOME_TEXT, model.display_name())
}
