use adw::prelude::*;
use relm4::factory::FactoryVecDeque;
use relm4::prelude::*;

use crate::config;
use crate::models::{AssistantModel, Conversation};

// --- ConversationRow factory component ---

#[derive(Debug)]
pub struct ConversationRow {
    pub id: String,
    title: String,
}

#[derive(Debug)]
pub enum ConversationRowMsg {
    SetTitle(String),
}

#[derive(Debug)]
pub enum ConversationRowOutput {
    Delete(String),
}

#[relm4::factory(pub)]
impl FactoryComponent for ConversationRow {
    type Init = Conversation;
    type Input = ConversationRowMsg;
    type Output = ConversationRowOutput;
    type CommandOutput = ();
    type ParentWidget = gtk::ListBox;

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Horizontal,
            set_spacing: 6,
            set_margin_all: 6,

            gtk::Image {
                set_icon_name: Some("chat-symbolic"),
                add_css_class: "dim-label",
            },

            gtk::Label {
                set_halign: gtk::Align::Start,
                set_hexpand: true,
                set_ellipsize: gtk::pango::EllipsizeMode::End,
                set_max_width_chars: 30,
                #[watch]
                set_label: &self.title,
            },

            gtk::Button {
                set_icon_name: "user-trash-symbolic",
                set_tooltip_text: Some("Hapus percakapan"),
                set_valign: gtk::Align::Center,
                add_css_class: "flat",
                add_css_class: "circular",
                connect_clicked[sender, id = self.id.clone()] => move |_| {
                    let _ = sender.output(ConversationRowOutput::Delete(id.clone()));
                },
            },
        }
    }

    fn init_model(conv: Self::Init, _index: &DynamicIndex, _sender: FactorySender<Self>) -> Self {
        Self {
            id: conv.id,
            title: conv.title,
        }
    }

    fn update(&mut self, msg: Self::Input, _sender: FactorySender<Self>) {
        match msg {
            ConversationRowMsg::SetTitle(title) => self.title = title,
        }
    }
}

// --- Sidebar component ---

pub struct Sidebar {
    conversations: FactoryVecDeque<ConversationRow>,
    model_dropdown: gtk::DropDown,
    selected_model: AssistantModel,
}

#[derive(Debug)]
pub enum SidebarMsg {
    LoadConversations(Vec<Conversation>),
    AddConversation(Conversation),
    RemoveConversation(String),
    UpdateConversationTitle(String, String),
    SetActive(Option<String>),
    NewChat,
    RowActivated(usize),
    DeleteConversation(String),
    ModelChanged(u32),
}

#[derive(Debug)]
pub enum SidebarOutput {
    NewChat,
    ConversationSelected(String),
    DeleteConversation(String),
    ModelSelected(AssistantModel),
    ModelUnavailable(AssistantModel),
}

#[relm4::component(pub)]
impl Component for Sidebar {
    type Init = ();
    type Input = SidebarMsg;
    type Output = SidebarOutput;
    type CommandOutput = ();

    view! {
        adw::ToolbarView {
            add_top_bar = &adw::HeaderBar {
                set_show_end_title_buttons: false,

                pack_start = &gtk::Button {
                    set_icon_name: "list-add-symbolic",
                    set_tooltip_text: Some("Chat Baru (Ctrl+N)"),
                    connect_clicked => SidebarMsg::NewChat,
                },

                #[wrap(Some)]
                set_title_widget = &adw::WindowTitle {
                    set_title: config::APP_NAME,
                },
            },

            #[wrap(Some)]
            set_content = &gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 6,

                gtk::Button {
                    set_label: "Chat Baru",
                    set_margin_start: 8,
                    set_margin_end: 8,
                    set_margin_top: 4,
                    add_css_class: "suggested-action",
                    add_css_class: "pill",
                    connect_clicked => SidebarMsg::NewChat,
                },

                gtk::Label {
                    set_label: "Model",
                    set_halign: gtk::Align::Start,
                    set_margin_start: 12,
                    set_margin_top: 6,
                    add_css_class: "dim-label",
                    add_css_class: "caption",
                },

                #[local_ref]
                model_dropdown -> gtk::DropDown {
                    set_margin_start: 8,
                    set_margin_end: 8,
                    set_tooltip_text: Some("Model asisten"),
                },

                gtk::Label {
                    set_label: "Riwayat Chat",
                    set_halign: gtk::Align::Start,
                    set_margin_start: 12,
                    set_margin_top: 8,
                    add_css_class: "dim-label",
                    add_css_class: "caption",
                    add_css_class: "sidebar-section-header",
                },

                gtk::Label {
                    set_label: "Belum ada percakapan",
                    set_margin_top: 24,
                    add_css_class: "dim-label",
                    #[watch]
                    set_visible: model.conversations.is_empty(),
                },

                gtk::ScrolledWindow {
                    set_hscrollbar_policy: gtk::PolicyType::Never,
                    set_vexpand: true,

                    #[local_ref]
                    conversation_list -> gtk::ListBox {
                        set_selection_mode: gtk::SelectionMode::Single,
                        add_css_class: "navigation-sidebar",
                    },
                },
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let conversations = FactoryVecDeque::builder()
            .launch(gtk::ListBox::default())
            .forward(sender.input_sender(), |output| match output {
                ConversationRowOutput::Delete(id) => SidebarMsg::DeleteConversation(id),
            });

        let model_names: Vec<&str> = AssistantModel::ALL
            .iter()
            .map(|m| m.display_name())
            .collect();
        let model_dropdown = gtk::DropDown::from_strings(&model_names);

        let model = Self {
            conversations,
            model_dropdown: model_dropdown.clone(),
            selected_model: AssistantModel::default(),
        };

        let conversation_list = model.conversations.widget();
        let widgets = view_output!();

        let sender_model = sender.clone();
        model.model_dropdown.connect_selected_notify(move |dd| {
            sender_model.input(SidebarMsg::ModelChanged(dd.selected()));
        });

        let sender_row = sender.clone();
        conversation_list.connect_row_activated(move |_, row| {
            sender_row.input(SidebarMsg::RowActivated(row.index() as usize));
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, _root: &Self::Root) {
        match msg {
            SidebarMsg::LoadConversations(conversations) => {
                let mut guard = self.conversations.guard();
                guard.clear();
                for conv in conversations {
                    guard.push_back(conv);
                }
            }
            SidebarMsg::AddConversation(conversation) => {
                self.conversations.guard().push_front(conversation);
            }
            SidebarMsg::RemoveConversation(id) => {
                let mut guard = self.conversations.guard();
                if let Some(index) = guard.iter().position(|r| r.id == id) {
                    guard.remove(index);
                }
            }
            SidebarMsg::UpdateConversationTitle(id, title) => {
                let guard = self.conversations.guard();
                if let Some(index) = guard.iter().position(|r| r.id == id) {
                    guard.send(index, ConversationRowMsg::SetTitle(title));
                }
            }
            SidebarMsg::SetActive(id) => {
                let list = self.conversations.widget();
                let index = id.and_then(|id| self.conversations.iter().position(|r| r.id == id));
                match index.and_then(|i| list.row_at_index(i as i32)) {
                    Some(row) => list.select_row(Some(&row)),
                    None => list.unselect_all(),
                }
            }
            SidebarMsg::NewChat => {
                let _ = sender.output(SidebarOutput::NewChat);
            }
            SidebarMsg::RowActivated(index) => {
                if let Some(row) = self.conversations.get(index) {
                    let _ = sender.output(SidebarOutput::ConversationSelected(row.id.clone()));
                }
            }
            SidebarMsg::DeleteConversation(id) => {
                let _ = sender.output(SidebarOutput::DeleteConversation(id));
            }
            SidebarMsg::ModelChanged(index) => {
                let Some(choice) = AssistantModel::from_index(index as usize) else {
                    return;
                };
                if choice == self.selected_model {
                    return;
                }
                if choice.is_available() {
                    self.selected_model = choice;
                    let _ = sender.output(SidebarOutput::ModelSelected(choice));
                } else {
                    // Snap back; this re-enters with the current model and stops above.
                    self.model_dropdown.set_selected(self.selected_index());
                    let _ = sender.output(SidebarOutput::ModelUnavailable(choice));
                }
            }
        }
    }
}

impl Sidebar {
    fn selected_index(&self) -> u32 {
        AssistantModel::ALL
            .iter()
            .position(|m| *m == self.selected_model)
            .unwrap_or(0) as u32
    }
}
