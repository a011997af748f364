use gtk::prelude::*;
use relm4::factory::FactoryVecDeque;
use relm4::prelude::*;

use crate::models::{FileRef, Message};
use crate::ui::input_area::{InputArea, InputAreaMsg, InputAreaOutput};
use crate::ui::message_widget::{MessageWidget, MessageWidgetOutput};

pub struct ChatView {
    messages: FactoryVecDeque<MessageWidget>,
    input_area: Controller<InputArea>,
    loading: bool,
    scrolled_window: gtk::ScrolledWindow,
    user_scrolled_up: bool,
}

#[derive(Debug)]
pub enum ChatViewMsg {
    AddMessage(Message),
    LoadMessages(Vec<Message>),
    Clear,
    /// Typing indicator under the transcript.
    SetLoading(bool),
    /// Blocks sending from the input while any request is in flight.
    SetInputLocked(bool),
    ClearInput,
    ScrollToBottom,
    // Internal
    ScrollPositionChanged,
    UserSendMessage(String),
    ForwardOpenFile(FileRef),
    ForwardOpenUri(String),
}

#[derive(Debug)]
pub enum ChatViewOutput {
    SendMessage(String),
    OpenFile(FileRef),
    OpenUri(String),
}

#[relm4::component(pub)]
impl Component for ChatView {
    type Init = ();
    type Input = ChatViewMsg;
    type Output = ChatViewOutput;
    type CommandOutput = ();

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Vertical,
            set_vexpand: true,

            gtk::Overlay {
                set_vexpand: true,

                #[local_ref]
                scrolled_window -> gtk::ScrolledWindow {
                    set_vexpand: true,
                    set_hscrollbar_policy: gtk::PolicyType::Never,

                    gtk::Box {
                        set_orientation: gtk::Orientation::Vertical,
                        set_spacing: 0,
                        set_margin_top: 8,
                        set_margin_bottom: 8,
                        set_margin_start: 16,
                        set_margin_end: 16,

                        #[local_ref]
                        message_list -> gtk::Box {
                            set_orientation: gtk::Orientation::Vertical,
                            set_spacing: 0,
                        },

                        #[local_ref]
                        loading_box -> gtk::Box {
                            set_orientation: gtk::Orientation::Horizontal,
                            set_halign: gtk::Align::Start,
                            set_margin_start: 12,
                            set_margin_top: 4,
                            set_spacing: 8,
                            add_css_class: "typing-indicator",
                            #[watch]
                            set_visible: model.loading,
                        },
                    },
                },

                add_overlay = &gtk::Button {
                    set_icon_name: "go-down-symbolic",
                    set_tooltip_text: Some("Gulir ke bawah"),
                    set_halign: gtk::Align::Center,
                    set_valign: gtk::Align::End,
                    set_margin_bottom: 8,
                    add_css_class: "circular",
                    add_css_class: "osd",
                    #[watch]
                    set_visible: model.user_scrolled_up,
                    connect_clicked => ChatViewMsg::ScrollToBottom,
                },
            },

            gtk::Separator {
                set_orientation: gtk::Orientation::Horizontal,
            },

            model.input_area.widget().clone(),
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let messages = FactoryVecDeque::builder()
            .launch(gtk::Box::default())
            .forward(sender.input_sender(), |output| match output {
                MessageWidgetOutput::OpenFile(file) => ChatViewMsg::ForwardOpenFile(file),
                MessageWidgetOutput::OpenUri(url) => ChatViewMsg::ForwardOpenUri(url),
            });

        let input_area = InputArea::builder()
            .launch(())
            .forward(sender.input_sender(), |output| match output {
                InputAreaOutput::SendMessage(text) => ChatViewMsg::UserSendMessage(text),
            });

        let scrolled_window = gtk::ScrolledWindow::new();

        let loading_box = gtk::Box::new(gtk::Orientation::Horizontal, 8);
        let spinner = gtk::Spinner::builder().spinning(true).build();
        loading_box.append(&spinner);
        let searching_label = gtk::Label::builder()
            .label("Mencari dokumen...")
            .build();
        searching_label.add_css_class("dim-label");
        loading_box.append(&searching_label);

        let model = Self {
            messages,
            input_area,
            loading: false,
            scrolled_window: scrolled_window.clone(),
            user_scrolled_up: false,
        };

        let message_list = model.messages.widget();
        let widgets = view_output!();

        let sender_scroll = sender.input_sender().clone();
        scrolled_window
            .vadjustment()
            .connect_value_changed(move |_| {
                let _ = sender_scroll.send(ChatViewMsg::ScrollPositionChanged);
            });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, _root: &Self::Root) {
        match msg {
            ChatViewMsg::AddMessage(message) => {
                self.messages.guard().push_back(message);
                sender.input(ChatViewMsg::ScrollToBottom);
            }
            ChatViewMsg::LoadMessages(messages) => {
                let mut guard = self.messages.guard();
                guard.clear();
                for message in messages {
                    guard.push_back(message);
                }
                drop(guard);
                sender.input(ChatViewMsg::ScrollToBottom);
            }
            ChatViewMsg::Clear => {
                self.messages.guard().clear();
                self.loading = false;
            }
            ChatViewMsg::SetLoading(loading) => {
                self.loading = loading;
                if loading {
                    sender.input(ChatViewMsg::ScrollToBottom);
                }
            }
            ChatViewMsg::SetInputLocked(locked) => {
                self.input_area.emit(InputAreaMsg::SetSending(locked));
            }
            ChatViewMsg::ClearInput => {
                self.input_area.emit(InputAreaMsg::Clear);
            }
            ChatViewMsg::ScrollToBottom => {
                self.user_scrolled_up = false;
                let adj = self.scrolled_window.vadjustment();
                glib::idle_add_local_once(move || {
                    adj.set_value(adj.upper());
                });
            }
            ChatViewMsg::ScrollPositionChanged => {
                let adj = self.scrolled_window.vadjustment();
                let at_bottom = adj.value() >= adj.upper() - adj.page_size() - 50.0;
                self.user_scrolled_up = !at_bottom;
            }
            ChatViewMsg::UserSendMessage(text) => {
                let _ = sender.output(ChatViewOutput::SendMessage(text));
            }
            ChatViewMsg::ForwardOpenFile(file) => {
                let _ = sender.output(ChatViewOutput::OpenFile(file));
            }
            ChatViewMsg::ForwardOpenUri(url) => {
                let _ = sender.output(ChatViewOutput::OpenUri(url));
            }
        }
    }
}
